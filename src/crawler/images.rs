//! Header image downloader
//!
//! Walks every stored game that has a header image URL and saves the image as
//! `<directory>/<appid>.jpg`. Successful downloads are recorded on the game
//! row and in the `downloaded` checkpoint. Failures are logged and left out of
//! the checkpoint so the next run tries them again.

use crate::checkpoint::{CheckpointStore, ImageCheckpoint};
use crate::config::Config;
use crate::crawler::fetcher::{FetchRequest, RetryPolicy, RetryingFetcher};
use crate::crawler::CrawlOptions;
use crate::state::{CrawlReport, ItemState};
use crate::storage::{GameRecord, Storage};
use crate::CrawlError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Image download driver
pub struct ImageDownloader<'a, S: Storage> {
    config: &'a Config,
    storage: S,
    fetcher: RetryingFetcher,
    checkpoint: CheckpointStore<ImageCheckpoint>,
    directory: PathBuf,
    pacing: Duration,
}

impl<'a, S: Storage> ImageDownloader<'a, S> {
    pub fn new(config: &'a Config, storage: S, client: Client) -> Self {
        Self {
            config,
            storage,
            fetcher: RetryingFetcher::new(client, RetryPolicy::from(&config.images.retry)),
            checkpoint: CheckpointStore::new(&config.images.checkpoint_path),
            directory: PathBuf::from(&config.images.directory),
            pacing: Duration::from_millis(config.images.pacing_ms),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Local file for one app's header image
    pub fn image_path(&self, appid: u64) -> PathBuf {
        self.directory.join(format!("{}.jpg", appid))
    }

    /// Downloads images until every candidate is handled or `limit`
    /// successful downloads have been made
    ///
    /// An existing `<appid>.jpg` is recorded without a request and counts
    /// toward the limit. A store failure while recording it ends the run.
    pub async fn run(&mut self, options: CrawlOptions) -> Result<CrawlReport, CrawlError> {
        let mut checkpoint = if options.resume {
            self.checkpoint.load()
        } else {
            self.checkpoint.reset()?;
            ImageCheckpoint::default()
        };

        std::fs::create_dir_all(&self.directory)?;

        let games = self.storage.games_with_header_image()?;
        tracing::info!("Games with a header image: {}", games.len());

        let mut report = CrawlReport::default();
        let mut downloaded = 0usize;

        for game in &games {
            if let Some(limit) = options.limit {
                if downloaded >= limit {
                    tracing::info!("Limit {} reached, stopping early", limit);
                    break;
                }
            }

            let state = ItemState::Pending;

            if checkpoint.is_downloaded(game.appid) {
                tracing::debug!("[{}] Already downloaded", game.appid);
                report.record(state.transition(ItemState::Skipped));
                continue;
            }

            let target = self.image_path(game.appid);
            let state = if target.exists() {
                tracing::info!("[{}] Using existing file {}", game.appid, target.display());
                self.storage
                    .set_local_image_path(game.appid, &target.display().to_string())?;
                state.transition(ItemState::Reused)
            } else {
                let state = self.download(game, &target, state).await;
                tokio::time::sleep(self.pacing).await;
                state
            };

            if matches!(state, ItemState::Saved | ItemState::Reused) {
                checkpoint.mark_downloaded(game.appid);
                self.checkpoint.save(&checkpoint)?;
                tracing::info!("[OK] {} saved to {}", game.appid, target.display());
                downloaded += 1;
            }
            report.record(state);
        }

        tracing::info!(
            "Image download finished: {} saved, {} reused, {} failed, {} skipped. Images in {}",
            report.saved,
            report.reused,
            report.failed,
            report.skipped,
            self.directory.display()
        );

        Ok(report)
    }

    /// Fetches one header image, writes it and records the local path
    ///
    /// Every failure ends in [`ItemState::Failed`] so the item is retried on
    /// the next run.
    async fn download(&mut self, game: &GameRecord, target: &Path, state: ItemState) -> ItemState {
        let Some(url) = game.header_image.as_deref() else {
            return state.transition(ItemState::Skipped);
        };

        tracing::info!("Downloading image for {} ({})", game.title, game.appid);
        let state = state.transition(ItemState::Fetching);
        let request =
            FetchRequest::new(url, self.config.http.request_timeout()).require_body();

        let Some(bytes) = self.fetcher.fetch(&request).await.into_body() else {
            tracing::warn!("[FAILED] Could not download {}", game.appid);
            return state.transition(ItemState::Failed);
        };

        if let Err(e) = write_atomically(target, &bytes) {
            tracing::error!("[{}] Failed to write {}: {}", game.appid, target.display(), e);
            return state.transition(ItemState::Failed);
        }

        let local_path = target.display().to_string();
        if let Err(e) = self.storage.set_local_image_path(game.appid, &local_path) {
            tracing::error!("[{}] Database error: {}", game.appid, e);
            return state.transition(ItemState::Failed);
        }

        state.transition(ItemState::Saved)
    }
}

/// Writes `<target>.tmp` then renames it over `target`
fn write_atomically(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = target.with_extension("jpg.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, target)
}
