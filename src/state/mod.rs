//! State module for tracking crawl progress
//!
//! Every work item moves through a small state machine:
//!
//! ```text
//! Pending -> Skipped
//! Pending -> Reused                  (images only, existing local file)
//! Pending -> Fetching -> Saved
//! Pending -> Fetching -> FailedMinimal
//! Pending -> Fetching -> Forfeited
//! Pending -> Fetching -> Failed      (images only, not checkpointed)
//! ```
//!
//! Drivers move items with [`ItemState::transition`], which checks each step
//! in debug builds. The terminal state of each item is tallied into a
//! [`CrawlReport`].

mod item_state;
mod report;

pub use item_state::ItemState;
pub use report::CrawlReport;
