//! JSON checkpoint files for resumable crawls
//!
//! A checkpoint is a small JSON document rewritten after every handled item.
//! Two shapes exist:
//! - [`CatalogCheckpoint`]: `{"next_index": N, "processed_appids": [...]}`
//! - [`ImageCheckpoint`]: `{"downloaded": [...]}`
//!
//! Both are stored through the same [`CheckpointStore`]. The store has a single
//! writer; two processes sharing one checkpoint file is not supported.

mod state;
mod store;

pub use state::{CatalogCheckpoint, ImageCheckpoint};
pub use store::CheckpointStore;

use thiserror::Error;

/// Errors raised while persisting a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error on checkpoint {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize checkpoint: {0}")]
    Serialization(#[from] serde_json::Error),
}
