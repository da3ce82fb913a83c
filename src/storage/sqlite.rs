//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::CrawlReport;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{DetailStatus, GameRecord, RunKind, RunRecord, RunStatus};
use crate::CrawlError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const GAME_COLUMNS: &str = "appid, title, description, header_image, is_free, release_date,
     developers, publishers, genres, price_overview, raw_json, detail_status,
     local_image_path, created_at";

const RUN_COLUMNS: &str = "id, kind, started_at, finished_at, config_hash, status,
     items_saved, items_placeholder, items_skipped, items_failed";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and ensures the schema exists
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_game(row: &Row<'_>) -> rusqlite::Result<GameRecord> {
    let appid: i64 = row.get(0)?;
    let is_free: i64 = row.get(4)?;
    let status: String = row.get(11)?;

    Ok(GameRecord {
        appid: appid as u64,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        header_image: row.get(3)?,
        is_free: is_free != 0,
        release_date: row.get(5)?,
        developers: row
            .get::<_, Option<String>>(6)?
            .unwrap_or_else(|| "[]".to_string()),
        publishers: row
            .get::<_, Option<String>>(7)?
            .unwrap_or_else(|| "[]".to_string()),
        genres: row
            .get::<_, Option<String>>(8)?
            .unwrap_or_else(|| "[]".to_string()),
        price_overview: row.get(9)?,
        raw_json: row
            .get::<_, Option<String>>(10)?
            .unwrap_or_else(|| "{}".to_string()),
        detail_status: DetailStatus::from_db_string(&status).unwrap_or(DetailStatus::Placeholder),
        local_image_path: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        kind: RunKind::from_db_string(&row.get::<_, String>(1)?).unwrap_or(RunKind::Populate),
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Running),
        items_saved: row.get::<_, i64>(6)? as u64,
        items_placeholder: row.get::<_, i64>(7)? as u64,
        items_skipped: row.get::<_, i64>(8)? as u64,
        items_failed: row.get::<_, i64>(9)? as u64,
    })
}

/// Maps unique-key failures to a dedicated error variant
fn classify_insert_error(appid: u64, err: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err {
        if code.code == ErrorCode::ConstraintViolation {
            return StorageError::ConstraintViolation(format!(
                "appid {} already stored: {}",
                appid, err
            ));
        }
    }
    StorageError::Sqlite(err)
}

impl Storage for SqliteStorage {
    // ===== Games =====

    fn game_exists(&self, appid: u64) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM games WHERE appid = ?1",
                params![appid as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_game(&mut self, game: &GameRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO games (appid, title, description, header_image, is_free, release_date,
             developers, publishers, genres, price_overview, raw_json, detail_status,
             local_image_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                game.appid as i64,
                game.title,
                game.description,
                game.header_image,
                game.is_free as i64,
                game.release_date,
                game.developers,
                game.publishers,
                game.genres,
                game.price_overview,
                game.raw_json,
                game.detail_status.to_db_string(),
                game.local_image_path,
                now,
            ],
        );

        match inserted {
            Ok(_) => {
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(id)
            }
            Err(e) => {
                tx.rollback()?;
                Err(classify_insert_error(game.appid, e))
            }
        }
    }

    fn get_game(&self, appid: u64) -> StorageResult<Option<GameRecord>> {
        let sql = format!("SELECT {} FROM games WHERE appid = ?1", GAME_COLUMNS);
        let game = self
            .conn
            .query_row(&sql, params![appid as i64], row_to_game)
            .optional()?;
        Ok(game)
    }

    fn games_with_header_image(&self) -> StorageResult<Vec<GameRecord>> {
        let sql = format!(
            "SELECT {} FROM games
             WHERE header_image IS NOT NULL AND header_image != ''
             ORDER BY appid",
            GAME_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let games = stmt
            .query_map([], row_to_game)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(games)
    }

    fn set_local_image_path(&mut self, appid: u64, path: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE games SET local_image_path = ?1, updated_at = ?2 WHERE appid = ?3",
            params![path, now, appid as i64],
        )?;

        if updated == 0 {
            return Err(StorageError::GameNotFound(appid));
        }
        Ok(())
    }

    // ===== Runs =====

    fn create_run(&mut self, kind: RunKind, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (kind, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                kind.to_db_string(),
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        report: &CrawlReport,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, items_saved = ?3,
             items_placeholder = ?4, items_skipped = ?5, items_failed = ?6
             WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                (report.saved + report.reused) as i64,
                report.placeholders as i64,
                report.skipped as i64,
                (report.failed + report.forfeited) as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], row_to_run)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], row_to_run).optional()?;
        Ok(run)
    }

    // ===== Statistics =====

    fn count_games(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_placeholders(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM games WHERE detail_status = ?1",
            params![DetailStatus::Placeholder.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_with_local_image(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM games WHERE local_image_path IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
