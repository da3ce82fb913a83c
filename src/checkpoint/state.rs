use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Progress of the catalog crawl
///
/// `processed_appids` is a set, so an id can never be recorded twice. It is
/// written as an ascending JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCheckpoint {
    /// Index into the listing of the next item to handle
    #[serde(default)]
    pub next_index: usize,

    #[serde(default, alias = "processed")]
    pub processed_appids: BTreeSet<u64>,
}

impl CatalogCheckpoint {
    pub fn is_processed(&self, appid: u64) -> bool {
        self.processed_appids.contains(&appid)
    }

    /// Records `appid` as handled and moves the cursor past `index`
    pub fn mark_processed(&mut self, appid: u64, index: usize) {
        self.processed_appids.insert(appid);
        self.advance_past(index);
    }

    /// Moves the cursor past `index` without touching the processed set
    pub fn advance_past(&mut self, index: usize) {
        self.next_index = index + 1;
    }
}

/// Progress of the image download crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCheckpoint {
    #[serde(default)]
    pub downloaded: BTreeSet<u64>,
}

impl ImageCheckpoint {
    pub fn is_downloaded(&self, appid: u64) -> bool {
        self.downloaded.contains(&appid)
    }

    pub fn mark_downloaded(&mut self, appid: u64) {
        self.downloaded.insert(appid);
    }
}
