//! End-to-end tests for the catalog crawl

use crate::common::{create_test_config, test_client, FailingInserts};
use serde_json::json;
use std::path::Path;
use steam_harvest::checkpoint::{CatalogCheckpoint, CheckpointStore};
use steam_harvest::crawler::{self, Coordinator, CrawlOptions};
use steam_harvest::storage::{DetailStatus, RunKind, RunStatus, SqliteStorage, Storage};
use steam_harvest::CrawlError;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_body() -> serde_json::Value {
    json!({
        "applist": {
            "apps": [
                {"appid": 1, "name": "One"},
                {"appid": 2, "name": "Two"},
                {"appid": 3, "name": "Three"}
            ]
        }
    })
}

fn details_body(appid: u64, name: &str) -> serde_json::Value {
    let entry = json!({
        "success": true,
        "data": {
            "name": name,
            "short_description": format!("About {}", name),
            "header_image": format!("https://cdn.example.com/{}/header.jpg", appid),
            "is_free": false,
            "developers": ["Studio"],
            "genres": [{"id": "1", "description": "Action"}]
        }
    });

    let mut envelope = serde_json::Map::new();
    envelope.insert(appid.to_string(), entry);
    serde_json::Value::Object(envelope)
}

async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, appid: u64, name: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/details"))
        .and(query_param("appids", appid.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body(appid, name)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn load_checkpoint(path: &str) -> CatalogCheckpoint {
    CheckpointStore::<CatalogCheckpoint>::new(path).load()
}

fn seed_checkpoint(path: &str, next_index: usize, processed: &[u64]) {
    let checkpoint = CatalogCheckpoint {
        next_index,
        processed_appids: processed.iter().copied().collect(),
    };
    CheckpointStore::new(path)
        .save(&checkpoint)
        .expect("Failed to seed checkpoint");
}

#[tokio::test]
async fn test_failing_item_becomes_placeholder() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_listing(&mock_server).await;
    mount_details(&mock_server, 1, "Game One", 1).await;
    mount_details(&mock_server, 3, "Game Three", 1).await;

    // Item 2 fails on every attempt; the retry cap is 3
    Mock::given(method("GET"))
        .and(path("/details"))
        .and(query_param("appids", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));
    let report = coordinator
        .run(CrawlOptions::default())
        .await
        .expect("Crawl failed");

    assert_eq!(report.saved, 2);
    assert_eq!(report.placeholders, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.handled, 3);

    let storage = coordinator.storage();
    assert_eq!(storage.count_games().unwrap(), 3);

    let one = storage.get_game(1).unwrap().expect("Game 1 missing");
    assert_eq!(one.title, "Game One");
    assert_eq!(one.description, "About Game One");
    assert_eq!(one.genres, r#"["Action"]"#);
    assert_eq!(one.detail_status, DetailStatus::Complete);

    let two = storage.get_game(2).unwrap().expect("Game 2 missing");
    assert_eq!(two.title, "Two");
    assert_eq!(two.description, "");
    assert_eq!(two.raw_json, "{}");
    assert_eq!(two.detail_status, DetailStatus::Placeholder);

    let three = storage.get_game(3).unwrap().expect("Game 3 missing");
    assert_eq!(three.title, "Game Three");

    let raw = std::fs::read_to_string(&config.catalog.checkpoint_path).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(raw["next_index"], json!(3));
    assert_eq!(raw["processed_appids"], json!([1, 2, 3]));
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_not_retried() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_listing(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/details"))
        .and(query_param("appids", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"1": {"success": false}})))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_details(&mock_server, 2, "Game Two", 1).await;
    mount_details(&mock_server, 3, "Game Three", 1).await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));
    let report = coordinator.run(CrawlOptions::default()).await.unwrap();

    assert_eq!(report.placeholders, 1);
    assert_eq!(report.saved, 2);
    let one = coordinator.storage().get_game(1).unwrap().unwrap();
    assert!(one.is_placeholder());
    assert_eq!(one.title, "One");
}

#[tokio::test]
async fn test_resume_skips_checkpointed_items() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    // Cursor at index 1; id 3 is already recorded ahead of the cursor
    seed_checkpoint(&config.catalog.checkpoint_path, 1, &[1, 3]);

    mount_listing(&mock_server).await;
    mount_details(&mock_server, 1, "Game One", 0).await;
    mount_details(&mock_server, 2, "Game Two", 1).await;
    mount_details(&mock_server, 3, "Game Three", 0).await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));
    let report = coordinator.run(CrawlOptions::default()).await.unwrap();

    assert_eq!(report.saved, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.handled, 2);
    assert_eq!(coordinator.storage().count_games().unwrap(), 1);

    let checkpoint = load_checkpoint(&config.catalog.checkpoint_path);
    assert_eq!(checkpoint.next_index, 3);
    assert_eq!(
        checkpoint.processed_appids.into_iter().collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn test_second_run_issues_no_requests() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_listing(&mock_server).await;
    // One call each across both runs
    mount_details(&mock_server, 1, "Game One", 1).await;
    mount_details(&mock_server, 2, "Game Two", 1).await;
    mount_details(&mock_server, 3, "Game Three", 1).await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));
    let first = coordinator.run(CrawlOptions::default()).await.unwrap();
    assert_eq!(first.saved, 3);

    let after_first = load_checkpoint(&config.catalog.checkpoint_path);
    let second = coordinator.run(CrawlOptions::default()).await.unwrap();
    assert_eq!(second.handled, 0);
    assert_eq!(load_checkpoint(&config.catalog.checkpoint_path), after_first);

    // Without a checkpoint the store lookup still prevents refetching
    std::fs::remove_file(&config.catalog.checkpoint_path).unwrap();
    let third = coordinator.run(CrawlOptions::default()).await.unwrap();
    assert_eq!(third.skipped, 3);
    assert_eq!(third.fetched, 0);
    assert_eq!(coordinator.storage().count_games().unwrap(), 3);
    assert_eq!(load_checkpoint(&config.catalog.checkpoint_path), after_first);
}

#[tokio::test]
async fn test_limit_counts_items_from_resume_point() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_listing(&mock_server).await;
    mount_details(&mock_server, 1, "Game One", 1).await;
    mount_details(&mock_server, 2, "Game Two", 1).await;
    mount_details(&mock_server, 3, "Game Three", 1).await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));

    let limited = CrawlOptions {
        limit: Some(2),
        resume: true,
    };
    let report = coordinator.run(limited).await.unwrap();
    assert_eq!(report.handled, 2);
    assert_eq!(load_checkpoint(&config.catalog.checkpoint_path).next_index, 2);
    assert!(!coordinator.storage().game_exists(3).unwrap());

    let zero = CrawlOptions {
        limit: Some(0),
        resume: true,
    };
    assert_eq!(coordinator.run(zero).await.unwrap().handled, 0);

    let rest = coordinator.run(CrawlOptions::default()).await.unwrap();
    assert_eq!(rest.handled, 1);
    assert!(coordinator.storage().game_exists(3).unwrap());
}

#[tokio::test]
async fn test_fresh_run_discards_checkpoint() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    seed_checkpoint(&config.catalog.checkpoint_path, 3, &[1, 2, 3]);

    mount_listing(&mock_server).await;
    mount_details(&mock_server, 1, "Game One", 1).await;
    mount_details(&mock_server, 2, "Game Two", 1).await;
    mount_details(&mock_server, 3, "Game Three", 1).await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));
    let fresh = CrawlOptions {
        limit: None,
        resume: false,
    };
    let report = coordinator.run(fresh).await.unwrap();

    assert_eq!(report.saved, 3);
    assert_eq!(coordinator.storage().count_games().unwrap(), 3);
}

#[tokio::test]
async fn test_listing_failure_is_fatal_and_leaves_checkpoint() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    seed_checkpoint(&config.catalog.checkpoint_path, 1, &[1]);
    let before = std::fs::read(&config.catalog.checkpoint_path).unwrap();

    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/details"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));

    // Even a fresh run must not reset the checkpoint before the listing arrives
    let result = coordinator
        .run(CrawlOptions {
            limit: None,
            resume: false,
        })
        .await;

    assert!(matches!(result, Err(CrawlError::Listing { .. })));
    assert_eq!(std::fs::read(&config.catalog.checkpoint_path).unwrap(), before);
    assert_eq!(coordinator.storage().count_games().unwrap(), 0);
}

#[tokio::test]
async fn test_insert_failure_is_forfeited_and_checkpointed() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_listing(&mock_server).await;
    mount_details(&mock_server, 1, "Game One", 1).await;
    mount_details(&mock_server, 2, "Game Two", 1).await;
    mount_details(&mock_server, 3, "Game Three", 1).await;

    let storage = FailingInserts {
        inner: SqliteStorage::new_in_memory().unwrap(),
        fail_appid: 2,
    };
    let mut coordinator = Coordinator::new(&config, storage, test_client(&config));
    let report = coordinator.run(CrawlOptions::default()).await.unwrap();

    assert_eq!(report.saved, 2);
    assert_eq!(report.forfeited, 1);
    assert!(!coordinator.storage().game_exists(2).unwrap());

    let checkpoint = load_checkpoint(&config.catalog.checkpoint_path);
    assert!(checkpoint.is_processed(2));
    assert_eq!(checkpoint.next_index, 3);
}

#[tokio::test]
async fn test_populate_records_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    mount_listing(&mock_server).await;
    mount_details(&mock_server, 1, "Game One", 1).await;
    mount_details(&mock_server, 2, "Game Two", 1).await;
    mount_details(&mock_server, 3, "Game Three", 1).await;

    let report = crawler::populate(&config, "hash-1", CrawlOptions::default())
        .await
        .expect("Populate failed");
    assert_eq!(report.saved, 3);

    let storage = SqliteStorage::new(Path::new(&config.storage.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().expect("No run recorded");
    assert_eq!(run.kind, RunKind::Populate);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash-1");
    assert_eq!(run.items_saved, 3);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_populate_marks_run_failed_on_listing_error() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = crawler::populate(&config, "hash-2", CrawlOptions::default()).await;
    assert!(result.is_err());

    let storage = SqliteStorage::new(Path::new(&config.storage.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().expect("No run recorded");
    assert_eq!(run.status, RunStatus::Failed);
    assert!(!Path::new(&config.catalog.checkpoint_path).exists());
}
