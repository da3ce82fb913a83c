//! Crawler module for the resumable catalog and image crawls
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and exponential backoff
//! - The catalog crawl driver (`populate`)
//! - The header image download driver (`images`)
//! - Run bookkeeping around both drivers

mod coordinator;
mod fetcher;
mod images;

pub use coordinator::Coordinator;
pub use fetcher::{
    attempt_once, build_http_client, AttemptOutcome, FetchOutcome, FetchRequest, RetryPolicy,
    RetryingFetcher,
};
pub use images::ImageDownloader;

pub use crate::state::CrawlReport;

use crate::config::Config;
use crate::storage::{open_storage, RunKind, RunStatus, Storage};
use crate::CrawlError;
use std::path::Path;

/// Per-invocation switches shared by both crawls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Catalog: items to handle from the resume point. Images: successful
    /// downloads. `None` means no bound.
    pub limit: Option<usize>,

    /// Load the checkpoint; when false it is discarded and the cursor starts at zero
    pub resume: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            limit: None,
            resume: true,
        }
    }
}

/// Runs the catalog crawl against the configured database
///
/// Opens the store, records a run row, drives the [`Coordinator`] and marks the
/// run completed or failed.
pub async fn populate(
    config: &Config,
    config_hash: &str,
    options: CrawlOptions,
) -> Result<CrawlReport, CrawlError> {
    let mut storage = open_storage(Path::new(&config.storage.database_path))?;
    let run_id = storage.create_run(RunKind::Populate, config_hash)?;
    tracing::info!("Starting populate run {}", run_id);

    let client = build_http_client(&config.http)?;
    let mut coordinator = Coordinator::new(config, storage, client);
    let result = coordinator.run(options).await;

    finish_run(coordinator.storage_mut(), run_id, &result);
    result
}

/// Runs the image download crawl against the configured database
pub async fn download_images(
    config: &Config,
    config_hash: &str,
    options: CrawlOptions,
) -> Result<CrawlReport, CrawlError> {
    let mut storage = open_storage(Path::new(&config.storage.database_path))?;
    let run_id = storage.create_run(RunKind::Images, config_hash)?;
    tracing::info!("Starting images run {}", run_id);

    let client = build_http_client(&config.http)?;
    let mut downloader = ImageDownloader::new(config, storage, client);
    let result = downloader.run(options).await;

    finish_run(downloader.storage_mut(), run_id, &result);
    result
}

/// Marks the run row completed or failed
///
/// A failure to update the row is logged; the crawl result is returned as is.
fn finish_run<S: Storage>(storage: &mut S, run_id: i64, result: &Result<CrawlReport, CrawlError>) {
    let finished = match result {
        Ok(report) => storage.finish_run(run_id, RunStatus::Completed, report),
        Err(e) => {
            tracing::error!("Run {} failed: {}", run_id, e);
            storage.finish_run(run_id, RunStatus::Failed, &CrawlReport::default())
        }
    };

    if let Err(e) = finished {
        tracing::error!("Failed to record the end of run {}: {}", run_id, e);
    }
}
