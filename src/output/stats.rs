//! Statistics generation from the games database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::CrawlError;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of game rows
    pub total_games: u64,

    /// Rows written from the listing name only
    pub placeholders: u64,

    /// Rows with a downloaded header image
    pub with_local_image: u64,

    /// Most recent populate or images run, if any
    pub latest_run: Option<RunRecord>,
}

impl HarvestStatistics {
    /// Rows written with full details
    pub fn complete(&self) -> u64 {
        self.total_games.saturating_sub(self.placeholders)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, CrawlError> {
    Ok(HarvestStatistics {
        total_games: storage.count_games()?,
        placeholders: storage.count_placeholders()?,
        with_local_image: storage.count_with_local_image()?,
        latest_run: storage.get_latest_run()?,
    })
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Seconds between a run's start and finish, when both parse
fn run_duration_seconds(run: &RunRecord) -> Option<i64> {
    let started = run.started_at.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
    let finished = run
        .finished_at
        .as_deref()?
        .parse::<chrono::DateTime<chrono::Utc>>()
        .ok()?;
    Some((finished - started).num_seconds())
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Games:");
    println!("  Total: {}", stats.total_games);
    println!(
        "  With full details: {} ({:.1}%)",
        stats.complete(),
        percentage(stats.complete(), stats.total_games)
    );
    println!(
        "  Placeholders: {} ({:.1}%)",
        stats.placeholders,
        percentage(stats.placeholders, stats.total_games)
    );
    println!(
        "  With local image: {} ({:.1}%)",
        stats.with_local_image,
        percentage(stats.with_local_image, stats.total_games)
    );
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Id: {}", run.id);
            println!("  Kind: {}", run.kind.to_db_string());
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            if let Some(secs) = run_duration_seconds(run) {
                println!("  Duration: {}s", secs);
            }
            println!("  Config hash: {}", run.config_hash);
            println!(
                "  Saved: {}, placeholders: {}, skipped: {}, failed: {}",
                run.items_saved, run.items_placeholder, run.items_skipped, run.items_failed
            );
        }
        None => println!("No runs recorded yet"),
    }
}
