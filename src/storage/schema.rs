//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Steam-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    items_saved INTEGER NOT NULL DEFAULT 0,
    items_placeholder INTEGER NOT NULL DEFAULT 0,
    items_skipped INTEGER NOT NULL DEFAULT 0,
    items_failed INTEGER NOT NULL DEFAULT 0
);

-- One row per storefront app, keyed by appid
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    appid INTEGER NOT NULL UNIQUE,
    title TEXT,
    description TEXT,
    header_image TEXT,
    is_free INTEGER NOT NULL DEFAULT 0,
    release_date TEXT,
    developers TEXT,
    publishers TEXT,
    genres TEXT,
    price_overview TEXT,
    raw_json TEXT,
    detail_status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    local_image_path TEXT
);

CREATE INDEX IF NOT EXISTS idx_games_appid ON games(appid);
CREATE INDEX IF NOT EXISTS idx_games_title ON games(title);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
