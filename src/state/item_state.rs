/// Work item state definitions for tracking crawl progress
///
/// This module defines all states a work item can be in during a crawl.
use std::fmt;

/// Represents the current state of one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// Item enumerated from the listing, cursor not yet past it
    Pending,

    /// Retrying fetcher invoked for this item
    Fetching,

    // ===== Terminal States =====
    /// Already checkpointed or already in the destination store, no request made
    Skipped,

    /// Fetched and written as a full record
    Saved,

    /// Fetch failed after all retries, a placeholder record was written
    FailedMinimal,

    /// Writing the record failed; the item is checkpointed and not retried
    Forfeited,

    /// Fetch failed and nothing was written; the item is retried next run
    Failed,

    /// A local file already existed and was recorded without a request
    Reused,
}

impl ItemState {
    /// Returns true if no further processing happens for this item
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Fetching)
    }

    /// Returns true if the item moves the checkpoint forward
    ///
    /// A forfeited write still advances; only [`ItemState::Failed`] leaves the
    /// item to be picked up again.
    pub fn advances_checkpoint(&self) -> bool {
        self.is_terminal() && !matches!(self, Self::Failed)
    }

    /// Moves to `next`, checking the transition in debug builds
    pub fn transition(self, next: ItemState) -> ItemState {
        debug_assert!(
            self.can_transition_to(next),
            "invalid item transition {} -> {}",
            self,
            next
        );
        next
    }

    /// Returns true if the item cost at least one network request
    pub fn made_request(&self) -> bool {
        matches!(
            self,
            Self::Fetching | Self::Saved | Self::FailedMinimal | Self::Forfeited | Self::Failed
        )
    }

    /// Checks whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Skipped)
                | (Self::Pending, Self::Reused)
                | (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Saved)
                | (Self::Fetching, Self::FailedMinimal)
                | (Self::Fetching, Self::Forfeited)
                | (Self::Fetching, Self::Failed)
        )
    }

    /// Converts the state to the string used in logs and run rows
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Skipped => "skipped",
            Self::Saved => "saved",
            Self::FailedMinimal => "failed_minimal",
            Self::Forfeited => "forfeited",
            Self::Failed => "failed",
            Self::Reused => "reused",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
