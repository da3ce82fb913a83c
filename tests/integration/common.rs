use std::path::Path;
use steam_harvest::config::{
    CatalogConfig, Config, HttpConfig, ImagesConfig, RetryConfig, StorageConfig,
};
use steam_harvest::crawler::build_http_client;
use steam_harvest::state::CrawlReport;
use steam_harvest::storage::{
    GameRecord, RunKind, RunRecord, RunStatus, Storage, StorageError, StorageResult,
};

/// Creates a test configuration pointing every endpoint at `base_url`
///
/// Pacing and backoff are kept to a few milliseconds.
pub fn create_test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        http: HttpConfig {
            user_agent: "steam-harvest-test".to_string(),
            request_timeout_secs: 5,
            listing_timeout_secs: 5,
        },
        storage: StorageConfig {
            database_path: dir.join("games.db").display().to_string(),
        },
        catalog: CatalogConfig {
            listing_url: format!("{}/listing", base_url),
            detail_url: format!("{}/details", base_url),
            language: "english".to_string(),
            country: "us".to_string(),
            checkpoint_path: dir.join("populate_progress.json").display().to_string(),
            pacing_ms: 1,
            retry: RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 1,
                backoff_factor: 1.5,
            },
        },
        images: ImagesConfig {
            directory: dir.join("images").display().to_string(),
            checkpoint_path: dir.join("image_progress.json").display().to_string(),
            pacing_ms: 1,
            retry: RetryConfig {
                max_attempts: 2,
                initial_delay_ms: 1,
                backoff_factor: 1.5,
            },
        },
    }
}

pub fn test_client(config: &Config) -> reqwest::Client {
    build_http_client(&config.http).expect("Failed to build client")
}

/// Store wrapper whose inserts fail for one appid
pub struct FailingInserts<S> {
    pub inner: S,
    pub fail_appid: u64,
}

impl<S: Storage> Storage for FailingInserts<S> {
    fn game_exists(&self, appid: u64) -> StorageResult<bool> {
        self.inner.game_exists(appid)
    }

    fn insert_game(&mut self, game: &GameRecord) -> StorageResult<i64> {
        if game.appid == self.fail_appid {
            return Err(StorageError::ConstraintViolation(format!(
                "simulated failure for {}",
                game.appid
            )));
        }
        self.inner.insert_game(game)
    }

    fn get_game(&self, appid: u64) -> StorageResult<Option<GameRecord>> {
        self.inner.get_game(appid)
    }

    fn games_with_header_image(&self) -> StorageResult<Vec<GameRecord>> {
        self.inner.games_with_header_image()
    }

    fn set_local_image_path(&mut self, appid: u64, path: &str) -> StorageResult<()> {
        self.inner.set_local_image_path(appid, path)
    }

    fn create_run(&mut self, kind: RunKind, config_hash: &str) -> StorageResult<i64> {
        self.inner.create_run(kind, config_hash)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        report: &CrawlReport,
    ) -> StorageResult<()> {
        self.inner.finish_run(run_id, status, report)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.inner.get_run(run_id)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        self.inner.get_latest_run()
    }

    fn count_games(&self) -> StorageResult<u64> {
        self.inner.count_games()
    }

    fn count_placeholders(&self) -> StorageResult<u64> {
        self.inner.count_placeholders()
    }

    fn count_with_local_image(&self) -> StorageResult<u64> {
        self.inner.count_with_local_image()
    }
}
