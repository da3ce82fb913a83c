//! Storage traits and error types
//!
//! This module defines the trait interface for the destination store and
//! associated error types.

use crate::state::CrawlReport;
use crate::storage::{GameRecord, RunKind, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Game not found: {0}")]
    GameNotFound(u64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for destination store implementations
///
/// The crawl drivers only talk to this trait, so tests can substitute a store
/// that fails on demand.
pub trait Storage {
    // ===== Games =====

    /// Checks whether a row with this appid exists
    fn game_exists(&self, appid: u64) -> StorageResult<bool>;

    /// Inserts a game inside its own transaction
    ///
    /// On error the transaction is rolled back and nothing is written.
    ///
    /// # Returns
    ///
    /// The row id of the new game
    fn insert_game(&mut self, game: &GameRecord) -> StorageResult<i64>;

    fn get_game(&self, appid: u64) -> StorageResult<Option<GameRecord>>;

    /// Games that have a header image URL, ordered by appid
    fn games_with_header_image(&self) -> StorageResult<Vec<GameRecord>>;

    /// Records where a game's header image was saved
    fn set_local_image_path(&mut self, appid: u64, path: &str) -> StorageResult<()>;

    // ===== Runs =====

    fn create_run(&mut self, kind: RunKind, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with its final status and counts
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        report: &CrawlReport,
    ) -> StorageResult<()>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Statistics =====

    fn count_games(&self) -> StorageResult<u64>;

    fn count_placeholders(&self) -> StorageResult<u64>;

    fn count_with_local_image(&self) -> StorageResult<u64>;
}
