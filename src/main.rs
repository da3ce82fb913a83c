//! Steam-Harvest main entry point
//!
//! This is the command-line interface for the resumable storefront catalog crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use steam_harvest::config::{load_config_with_hash, Config};
use steam_harvest::crawler::{self, CrawlOptions, CrawlReport};
use steam_harvest::output::{load_statistics, print_statistics};
use steam_harvest::storage::open_storage;
use tracing_subscriber::EnvFilter;

/// Steam-Harvest: a resumable storefront catalog crawler
///
/// Populates a SQLite `games` table from the storefront app listing and
/// downloads header images. Both crawls checkpoint their progress and resume
/// where an interrupted run stopped.
#[derive(Parser, Debug)]
#[command(name = "steam-harvest")]
#[command(version)]
#[command(about = "A resumable storefront catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the app listing and store details for every app
    Populate {
        /// Handle at most N items from the resume point
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Discard the checkpoint and start from the first item
        #[arg(long, visible_alias = "no-resume")]
        fresh: bool,
    },

    /// Download header images for stored games
    Images {
        /// Stop after N successful downloads
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Discard the checkpoint and revisit every game
        #[arg(long)]
        fresh: bool,
    },

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.command);
        return Ok(());
    }

    match cli.command {
        Command::Populate { limit, fresh } => {
            let options = CrawlOptions {
                limit,
                resume: !fresh,
            };
            if fresh {
                tracing::info!("Starting fresh populate run (ignoring checkpoint)");
            }
            let report = crawler::populate(&config, &config_hash, options)
                .await
                .context("populate failed")?;
            print_report("Populate", &report);
        }
        Command::Images { limit, fresh } => {
            let options = CrawlOptions {
                limit,
                resume: !fresh,
            };
            if fresh {
                tracing::info!("Starting fresh images run (ignoring checkpoint)");
            }
            let report = crawler::download_images(&config, &config_hash, options)
                .await
                .context("image download failed")?;
            print_report("Images", &report);
        }
        Command::Stats => handle_stats(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("steam_harvest=info,warn"),
            1 => EnvFilter::new("steam_harvest=debug,info"),
            2 => EnvFilter::new("steam_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: shows the resolved configuration for the chosen command
fn handle_dry_run(config: &Config, command: &Command) {
    println!("=== Steam-Harvest Dry Run ===\n");

    println!("HTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Listing timeout: {}s", config.http.listing_timeout_secs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    match command {
        Command::Populate { limit, fresh } => {
            let catalog = &config.catalog;
            println!("\nPopulate:");
            println!("  Listing: {}", catalog.listing_url);
            println!("  Details: {}", catalog.detail_url);
            println!("  Language / country: {} / {}", catalog.language, catalog.country);
            println!("  Checkpoint: {}", catalog.checkpoint_path);
            println!("  Pacing: {}ms", catalog.pacing_ms);
            println!(
                "  Retry: {} attempts, {}ms x {}",
                catalog.retry.max_attempts, catalog.retry.initial_delay_ms, catalog.retry.backoff_factor
            );
            print_invocation(*limit, *fresh);
        }
        Command::Images { limit, fresh } => {
            let images = &config.images;
            println!("\nImages:");
            println!("  Directory: {}", images.directory);
            println!("  Checkpoint: {}", images.checkpoint_path);
            println!("  Pacing: {}ms", images.pacing_ms);
            println!(
                "  Retry: {} attempts, {}ms x {}",
                images.retry.max_attempts, images.retry.initial_delay_ms, images.retry.backoff_factor
            );
            print_invocation(*limit, *fresh);
        }
        Command::Stats => {}
    }

    println!("\n✓ Configuration is valid");
}

fn print_invocation(limit: Option<usize>, fresh: bool) {
    match limit {
        Some(n) => println!("  Limit: {}", n),
        None => println!("  Limit: none"),
    }
    println!("  Resume: {}", if fresh { "no" } else { "yes" });
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

fn print_report(label: &str, report: &CrawlReport) {
    println!(
        "{} finished: {} written ({} full, {} placeholders), {} reused, {} skipped, {} forfeited, {} failed",
        label,
        report.records_written(),
        report.saved,
        report.placeholders,
        report.reused,
        report.skipped,
        report.forfeited,
        report.failed
    );
}
