//! Storefront catalog endpoints
//!
//! - [`listing`]: the one-shot app listing that produces the work items
//! - [`details`]: the per-app detail envelope and its mapping onto a
//!   [`GameRecord`](crate::storage::GameRecord)

pub mod details;
pub mod listing;

pub use details::{detail_url, extract_detail_data, game_from_details};
pub use listing::{fetch_app_list, parse_app_list};

/// One app from the listing: the unit of work for the catalog crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub appid: u64,
    pub name: String,
}

impl WorkItem {
    pub fn new(appid: u64, name: impl Into<String>) -> Self {
        Self {
            appid,
            name: name.into(),
        }
    }
}
