use crate::state::ItemState;

/// Per-state tally of one crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub saved: u64,
    pub placeholders: u64,
    pub skipped: u64,
    pub forfeited: u64,
    pub failed: u64,
    /// Existing local files recorded without a request
    pub reused: u64,
    /// Items that reached a terminal state in this run
    pub handled: u64,
    /// Items whose handling issued at least one request
    pub fetched: u64,
}

impl CrawlReport {
    /// Adds one item's terminal state to the tally
    ///
    /// Active states are ignored.
    pub fn record(&mut self, state: ItemState) {
        match state {
            ItemState::Pending | ItemState::Fetching => return,
            ItemState::Skipped => self.skipped += 1,
            ItemState::Saved => self.saved += 1,
            ItemState::FailedMinimal => self.placeholders += 1,
            ItemState::Forfeited => self.forfeited += 1,
            ItemState::Failed => self.failed += 1,
            ItemState::Reused => self.reused += 1,
        }

        self.handled += 1;
        if state.made_request() {
            self.fetched += 1;
        }
    }

    /// Number of rows written to the destination store
    pub fn records_written(&self) -> u64 {
        self.saved + self.placeholders
    }
}
