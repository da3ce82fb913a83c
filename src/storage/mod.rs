//! Storage module for persisting harvested games
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Game rows keyed by appid, looked up before each fetch
//! - Run tracking for the `populate` and `images` crawls

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::CrawlError;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CrawlError> {
    SqliteStorage::new(path)
}

/// Whether a game row carries full details or only the listing name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStatus {
    Complete,
    Placeholder,
}

impl DetailStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Placeholder => "placeholder",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "complete" => Some(Self::Complete),
            "placeholder" => Some(Self::Placeholder),
            _ => None,
        }
    }
}

/// Represents a game in the database
///
/// `developers`, `publishers` and `genres` hold JSON arrays; `price_overview`
/// and `raw_json` hold JSON objects.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub appid: u64,
    pub title: String,
    pub description: String,
    pub header_image: Option<String>,
    pub is_free: bool,
    pub release_date: Option<String>,
    pub developers: String,
    pub publishers: String,
    pub genres: String,
    pub price_overview: Option<String>,
    pub raw_json: String,
    pub detail_status: DetailStatus,
    pub local_image_path: Option<String>,
    /// Set by the store on insert
    pub created_at: Option<String>,
}

impl GameRecord {
    /// Builds the degraded record written when details could not be fetched
    ///
    /// Falls back to `App <appid>` when the listing had no name.
    pub fn placeholder(appid: u64, name: &str) -> Self {
        let title = if name.trim().is_empty() {
            format!("App {}", appid)
        } else {
            name.to_string()
        };

        Self {
            appid,
            title,
            description: String::new(),
            header_image: None,
            is_free: false,
            release_date: None,
            developers: "[]".to_string(),
            publishers: "[]".to_string(),
            genres: "[]".to_string(),
            price_overview: None,
            raw_json: "{}".to_string(),
            detail_status: DetailStatus::Placeholder,
            local_image_path: None,
            created_at: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.detail_status == DetailStatus::Placeholder
    }
}

/// Which crawl a run row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Populate,
    Images,
}

impl RunKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Populate => "populate",
            Self::Images => "images",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "populate" => Some(Self::Populate),
            "images" => Some(Self::Images),
            _ => None,
        }
    }
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub kind: RunKind,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub items_saved: u64,
    pub items_placeholder: u64,
    pub items_skipped: u64,
    pub items_failed: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
