//! End-to-end tests for the header image download

use crate::common::{create_test_config, test_client};
use std::path::Path;
use steam_harvest::checkpoint::{CheckpointStore, ImageCheckpoint};
use steam_harvest::crawler::{self, CrawlOptions, ImageDownloader};
use steam_harvest::storage::{DetailStatus, GameRecord, RunKind, SqliteStorage, Storage};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg";

fn game_with_image(appid: u64, base_url: &str) -> GameRecord {
    let mut game = GameRecord::placeholder(appid, &format!("Game {}", appid));
    game.detail_status = DetailStatus::Complete;
    game.header_image = Some(format!("{}/img/{}.jpg", base_url, appid));
    game
}

fn storage_with_games<S: Storage>(mut storage: S, base_url: &str, appids: &[u64]) -> S {
    for appid in appids {
        storage
            .insert_game(&game_with_image(*appid, base_url))
            .expect("Failed to insert game");
    }
    storage
}

async fn mount_image(server: &MockServer, appid: u64, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/img/{}.jpg", appid)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG_BYTES))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_missing_image(server: &MockServer, appid: u64, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/img/{}.jpg", appid)))
        .respond_with(ResponseTemplate::new(404))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn load_checkpoint(path: &str) -> ImageCheckpoint {
    CheckpointStore::<ImageCheckpoint>::new(path).load()
}

#[tokio::test]
async fn test_downloads_and_records_images() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_image(&mock_server, 10, 1).await;
    mount_image(&mock_server, 20, 1).await;

    let storage = storage_with_games(
        SqliteStorage::new_in_memory().unwrap(),
        &mock_server.uri(),
        &[10, 20],
    );
    let mut downloader = ImageDownloader::new(&config, storage, test_client(&config));
    let report = downloader.run(CrawlOptions::default()).await.unwrap();

    assert_eq!(report.saved, 2);
    assert_eq!(report.failed, 0);

    let target = downloader.image_path(10);
    assert_eq!(std::fs::read(&target).unwrap(), JPEG_BYTES.to_vec());

    let game = downloader.storage().get_game(10).unwrap().unwrap();
    assert_eq!(game.local_image_path, Some(target.display().to_string()));
    assert_eq!(downloader.storage().count_with_local_image().unwrap(), 2);

    let checkpoint = load_checkpoint(&config.images.checkpoint_path);
    assert!(checkpoint.is_downloaded(10));
    assert!(checkpoint.is_downloaded(20));
}

#[tokio::test]
async fn test_failed_download_is_retried_next_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    // Image retry cap is 2
    mount_missing_image(&mock_server, 30, 2).await;

    let storage = storage_with_games(
        SqliteStorage::new_in_memory().unwrap(),
        &mock_server.uri(),
        &[30],
    );
    let mut downloader = ImageDownloader::new(&config, storage, test_client(&config));
    let report = downloader.run(CrawlOptions::default()).await.unwrap();

    assert_eq!(report.failed, 1);
    assert!(!downloader.image_path(30).exists());
    assert!(!load_checkpoint(&config.images.checkpoint_path).is_downloaded(30));
    let game = downloader.storage().get_game(30).unwrap().unwrap();
    assert!(game.local_image_path.is_none());

    mock_server.verify().await;
    mock_server.reset().await;
    mount_image(&mock_server, 30, 1).await;

    let report = downloader.run(CrawlOptions::default()).await.unwrap();
    assert_eq!(report.saved, 1);
    assert!(load_checkpoint(&config.images.checkpoint_path).is_downloaded(30));
}

#[tokio::test]
async fn test_existing_file_is_recorded_without_request() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_image(&mock_server, 40, 0).await;

    std::fs::create_dir_all(&config.images.directory).unwrap();
    let existing = Path::new(&config.images.directory).join("40.jpg");
    std::fs::write(&existing, b"already here").unwrap();

    let storage = storage_with_games(
        SqliteStorage::new_in_memory().unwrap(),
        &mock_server.uri(),
        &[40],
    );
    let mut downloader = ImageDownloader::new(&config, storage, test_client(&config));
    let report = downloader.run(CrawlOptions::default()).await.unwrap();

    assert_eq!(report.reused, 1);
    assert_eq!(report.saved, 0);
    assert_eq!(report.fetched, 0);
    assert!(load_checkpoint(&config.images.checkpoint_path).is_downloaded(40));
    assert_eq!(std::fs::read(&existing).unwrap(), b"already here".to_vec());
    assert!(downloader
        .storage()
        .get_game(40)
        .unwrap()
        .unwrap()
        .local_image_path
        .is_some());
}

#[tokio::test]
async fn test_checkpointed_ids_are_skipped() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    let mut seeded = ImageCheckpoint::default();
    seeded.mark_downloaded(50);
    CheckpointStore::new(&config.images.checkpoint_path)
        .save(&seeded)
        .unwrap();

    mount_image(&mock_server, 50, 0).await;
    mount_image(&mock_server, 60, 1).await;

    let storage = storage_with_games(
        SqliteStorage::new_in_memory().unwrap(),
        &mock_server.uri(),
        &[50, 60],
    );
    let mut downloader = ImageDownloader::new(&config, storage, test_client(&config));
    let report = downloader.run(CrawlOptions::default()).await.unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.saved, 1);
}

#[tokio::test]
async fn test_limit_counts_successful_downloads() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_missing_image(&mock_server, 70, 2).await;
    mount_image(&mock_server, 80, 1).await;
    mount_image(&mock_server, 90, 0).await;

    let storage = storage_with_games(
        SqliteStorage::new_in_memory().unwrap(),
        &mock_server.uri(),
        &[70, 80, 90],
    );
    let mut downloader = ImageDownloader::new(&config, storage, test_client(&config));
    let report = downloader
        .run(CrawlOptions {
            limit: Some(1),
            resume: true,
        })
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.saved, 1);
    assert!(!downloader.image_path(90).exists());
}

#[tokio::test]
async fn test_download_images_records_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_image(&mock_server, 100, 1).await;

    let db_path = Path::new(&config.storage.database_path);
    let storage = storage_with_games(SqliteStorage::new(db_path).unwrap(), &mock_server.uri(), &[100]);
    drop(storage);

    let report = crawler::download_images(&config, "hash-3", CrawlOptions::default())
        .await
        .expect("Image download failed");
    assert_eq!(report.saved, 1);

    let storage = SqliteStorage::new(db_path).unwrap();
    let run = storage.get_latest_run().unwrap().expect("No run recorded");
    assert_eq!(run.kind, RunKind::Images);
    assert_eq!(run.items_saved, 1);
}
