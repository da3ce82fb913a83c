//! Catalog crawl coordinator
//!
//! Drives the `populate` crawl: fetch the listing once, resume from the
//! checkpoint cursor, and handle one item at a time:
//!
//! 1. Skip ids already in the checkpoint, then ids already in the store
//! 2. Fetch details through the retrying fetcher
//! 3. Write a full record, or a placeholder when no usable details came back
//! 4. Advance and persist the checkpoint before touching the next item
//!
//! A failed write is rolled back, logged and forfeited; it still advances the
//! checkpoint. Only a listing failure, a store lookup failure or a checkpoint
//! write failure ends the run with an error.

use crate::catalog::{detail_url, extract_detail_data, fetch_app_list, game_from_details, WorkItem};
use crate::checkpoint::{CatalogCheckpoint, CheckpointStore};
use crate::config::Config;
use crate::crawler::fetcher::{FetchRequest, RetryPolicy, RetryingFetcher};
use crate::crawler::CrawlOptions;
use crate::state::{CrawlReport, ItemState};
use crate::storage::{GameRecord, Storage};
use crate::CrawlError;
use reqwest::Client;
use std::time::Duration;

/// Catalog crawl driver
pub struct Coordinator<'a, S: Storage> {
    config: &'a Config,
    storage: S,
    client: Client,
    fetcher: RetryingFetcher,
    checkpoint: CheckpointStore<CatalogCheckpoint>,
    pacing: Duration,
}

impl<'a, S: Storage> Coordinator<'a, S> {
    /// Creates a coordinator writing into `storage`
    ///
    /// The same `client` serves the listing and the detail requests.
    pub fn new(config: &'a Config, storage: S, client: Client) -> Self {
        let fetcher = RetryingFetcher::new(
            client.clone(),
            RetryPolicy::from(&config.catalog.retry),
        );

        Self {
            config,
            storage,
            client,
            fetcher,
            checkpoint: CheckpointStore::new(&config.catalog.checkpoint_path),
            pacing: Duration::from_millis(config.catalog.pacing_ms),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Runs the crawl loop until the listing is exhausted or `limit` is hit
    pub async fn run(&mut self, options: CrawlOptions) -> Result<CrawlReport, CrawlError> {
        let config = self.config;

        // Fatal on failure; the checkpoint has not been touched yet
        let items = fetch_app_list(
            &self.client,
            &config.catalog.listing_url,
            config.http.listing_timeout(),
        )
        .await?;

        let mut checkpoint = if options.resume {
            self.checkpoint.load()
        } else {
            self.checkpoint.reset()?;
            CatalogCheckpoint::default()
        };

        let total = items.len();
        let start = checkpoint.next_index.min(total);
        tracing::info!("Starting at index {} / {}", start, total);

        let mut report = CrawlReport::default();

        for (index, item) in items.iter().enumerate().skip(start) {
            if let Some(limit) = options.limit {
                if index - start >= limit {
                    tracing::info!("Limit {} reached, stopping early", limit);
                    break;
                }
            }

            let state = self.process_item(index, total, item, &mut checkpoint).await?;
            report.record(state);

            if state.made_request() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        tracing::info!(
            "Catalog crawl finished: {} saved, {} placeholders, {} skipped, {} forfeited. Progress in {}",
            report.saved,
            report.placeholders,
            report.skipped,
            report.forfeited,
            self.checkpoint.path().display()
        );

        Ok(report)
    }

    /// Handles one work item and persists the checkpoint
    ///
    /// Returns the item's terminal state.
    async fn process_item(
        &mut self,
        index: usize,
        total: usize,
        item: &WorkItem,
        checkpoint: &mut CatalogCheckpoint,
    ) -> Result<ItemState, CrawlError> {
        let appid = item.appid;
        let state = ItemState::Pending;

        if checkpoint.is_processed(appid) {
            tracing::info!(
                "[{}/{}] Skipping {} ({}): already processed",
                index,
                total,
                appid,
                item.name
            );
            checkpoint.advance_past(index);
            self.checkpoint.save(checkpoint)?;
            return Ok(state.transition(ItemState::Skipped));
        }

        if self.storage.game_exists(appid)? {
            tracing::info!(
                "[{}/{}] Skipping {} ({}): exists in database",
                index,
                total,
                appid,
                item.name
            );
            checkpoint.mark_processed(appid, index);
            self.checkpoint.save(checkpoint)?;
            return Ok(state.transition(ItemState::Skipped));
        }

        tracing::info!(
            "[{}/{}] Fetching details for {} ({})",
            index,
            total,
            appid,
            item.name
        );
        let state = state.transition(ItemState::Fetching);
        let (record, fetched_state) = self.fetch_record(item).await?;

        let state = match self.storage.insert_game(&record) {
            Ok(_) => {
                match fetched_state {
                    ItemState::Saved => tracing::info!("[{}] Saved: {}", appid, record.title),
                    _ => tracing::info!("[{}] Saved placeholder: {}", appid, record.title),
                }
                state.transition(fetched_state)
            }
            Err(e) => {
                tracing::error!("[{}] Database error: {}; skipping", appid, e);
                state.transition(ItemState::Forfeited)
            }
        };

        if state.advances_checkpoint() {
            checkpoint.mark_processed(appid, index);
            self.checkpoint.save(checkpoint)?;
        }
        tracing::debug!("[{}] Finished as {}", appid, state);
        Ok(state)
    }

    /// Fetches details and maps them to a record
    ///
    /// Falls back to a placeholder when the fetch fails or the payload holds
    /// no usable data.
    async fn fetch_record(&self, item: &WorkItem) -> Result<(GameRecord, ItemState), CrawlError> {
        let catalog = &self.config.catalog;
        let url = detail_url(
            &catalog.detail_url,
            item.appid,
            &catalog.language,
            &catalog.country,
        )?;
        let request = FetchRequest::new(url.as_str(), self.config.http.request_timeout());

        let data = self
            .fetcher
            .fetch(&request)
            .await
            .into_body()
            .and_then(|body| extract_detail_data(item.appid, &body));

        Ok(match data {
            Some(data) => (
                game_from_details(item.appid, &item.name, &data),
                ItemState::Saved,
            ),
            None => {
                tracing::info!(
                    "[{}] No details available, saving minimal record",
                    item.appid
                );
                (
                    GameRecord::placeholder(item.appid, &item.name),
                    ItemState::FailedMinimal,
                )
            }
        })
    }
}
