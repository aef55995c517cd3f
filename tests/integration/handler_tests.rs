//! Handler runs with persistence against local mock servers

use crate::{html_page, test_config};
use page_lens::config::Config;
use page_lens::handler::{Handler, ScrapeEvent, USAGE};
use page_lens::storage::{open_store, RecordStatus, ScrapeStore};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn persistent_config(dir: &TempDir) -> Config {
    let mut config = test_config();
    config.storage.enabled = true;
    config.storage.database_path = dir.path().join("scrapes.db").display().to_string();
    config
}

async fn mount_page(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Stored", "<p>Persist me</p>"))
                .insert_header("content-type", "text/html"),
        )
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_handle_query_event_without_storage() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server).await;

    let handler = Handler::from_config(&test_config()).unwrap();
    assert!(!handler.persistence_enabled());

    let url = format!("{}/page", mock_server.uri());
    let response = handler
        .handle(&ScrapeEvent::from_query([("url", url.as_str()), ("retries", "2")]))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    let body = response.body_json().unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["saved"], false);
    assert_eq!(body["data"]["content"]["title"], "Stored");
    assert_eq!(body["data"]["metadata"]["attempts"], 1);
}

#[tokio::test]
async fn test_handle_body_event_persists_success() {
    let dir = TempDir::new().unwrap();
    let config = persistent_config(&dir);
    let mock_server = MockServer::start().await;
    mount_page(&mock_server).await;

    let handler = Handler::from_config(&config).unwrap();
    assert!(handler.persistence_enabled());

    let url = format!("{}/page", mock_server.uri());
    let event = ScrapeEvent::from_body(json!({
        "url": url,
        "user_id": "alice",
        "project_id": "homepage"
    }));
    let response = handler.handle(&event).await;

    assert_eq!(response.status_code, 200);
    let body = response.body_json().unwrap();
    assert_eq!(body["saved"], true);
    assert_eq!(body["project_id"], "homepage");

    let store = open_store(dir.path().join("scrapes.db").as_path()).unwrap();
    let record = store.get_record("alice", "homepage").unwrap().unwrap();
    assert_eq!(record.status, RecordStatus::Success);
    assert_eq!(record.url, url);
    assert_eq!(record.payload["content"]["title"], "Stored");
    assert_eq!(store.records_for_user("alice", 50).unwrap().len(), 1);
    assert_eq!(store.recent_records("alice", 7).unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_is_persisted_and_returns_500() {
    let dir = TempDir::new().unwrap();
    let config = persistent_config(&dir);
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handler = Handler::from_config(&config).unwrap();
    let response = handler
        .handle(&ScrapeEvent::from_query([
            ("url", mock_server.uri().as_str()),
            ("user_id", "bob"),
        ]))
        .await;

    assert_eq!(response.status_code, 500);
    let body = response.body_json().unwrap();
    assert_eq!(body["details"]["kind"], "forbidden");
    assert_eq!(body["usage"], USAGE);
    assert_eq!(body["saved"], true);

    let store = open_store(dir.path().join("scrapes.db").as_path()).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.total_records, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.distinct_users, 1);
}

#[tokio::test]
async fn test_missing_user_id_with_storage_returns_400() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let handler = Handler::from_config(&persistent_config(&dir)).unwrap();
    let response = handler
        .handle(&ScrapeEvent::from_query([("url", mock_server.uri())]))
        .await;

    assert_eq!(response.status_code, 400);
    assert_eq!(
        response.body_json().unwrap()["error"],
        "Missing user_id parameter"
    );
}

#[tokio::test]
async fn test_invalid_url_returns_400() {
    let handler = Handler::from_config(&test_config()).unwrap();
    let response = handler
        .handle(&ScrapeEvent::from_query([("url", "javascript:alert(1)")]))
        .await;

    assert_eq!(response.status_code, 400);
    let body = response.body_json().unwrap();
    assert!(body["error"].as_str().unwrap().contains("scheme"));
    assert_eq!(body["usage"], USAGE);
}

#[tokio::test]
async fn test_query_url_wins_over_malformed_body() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server).await;

    let url = format!("{}/page", mock_server.uri());
    let mut event = ScrapeEvent::from_query([("url", url.as_str())]);
    event.body = Some(json!("{this is not json"));

    let handler = Handler::from_config(&test_config()).unwrap();
    let response = handler.handle(&event).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body_json().unwrap()["data"]["content"]["title"], "Stored");
}
