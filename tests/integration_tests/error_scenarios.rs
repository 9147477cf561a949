//! Error scenario integration tests
//!
//! Tests various failure modes and error handling:
//! 1. HTTP error responses and timeouts
//! 2. Recovery after failures
//! 3. Corrupt snapshots
//! 4. Notification endpoint outages
//! 5. Pages that lost their listing

use std::sync::Arc;
use std::time::Duration;

use sitewatch::crawler::HttpFetcher;
use sitewatch::error::{Error, ErrorCategory, SitewatchErrorTrait};
use sitewatch::monitor::MonitorWorker;
use sitewatch::notifications::{NotificationDispatcher, WebhookConfig, WebhookNotifier};
use sitewatch::utils::error::{FetchError, PersistenceError};
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{listing_site, LISTING_V1, LISTING_V2, REDESIGNED_PAGE};

fn worker_for(server: &MockServer, dir: &TempDir, dispatcher: NotificationDispatcher) -> MonitorWorker {
    let fetcher =
        HttpFetcher::with_config(Duration::from_millis(300), "sitewatch-test/1.0", 1 << 20).unwrap();
    MonitorWorker::new(
        listing_site("forum", &server.uri(), dir.path()),
        Arc::new(fetcher),
        dispatcher,
    )
    .unwrap()
}

// ============================================================================
// Network Error Tests
// ============================================================================

#[tokio::test]
async fn test_server_error_recorded_and_recovered() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let worker = worker_for(&server, &dir, NotificationDispatcher::disabled());

    for _ in 0..2 {
        let err = worker.run_tick().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Status(500))));
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_recoverable());
    }

    let status = worker.status().await;
    assert_eq!(status.consecutive_failures, 2);
    assert_eq!(status.last_error.as_deref(), Some("fetch failed: HTTP 500"));
    assert_eq!(status.updates_count, 0);
    assert!(!dir.path().join("forum.json").exists());

    let report = worker.run_tick().await.unwrap();
    assert_eq!(report.new_items.len(), 2);

    let status = worker.status().await;
    assert_eq!(status.consecutive_failures, 0);
    assert!(status.last_error.is_none());
    assert_eq!(status.total_checks, 3);
}

#[tokio::test]
async fn test_timeout_keeps_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LISTING_V2)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let worker = worker_for(&server, &dir, NotificationDispatcher::disabled());

    worker.run_tick().await.unwrap();
    let before = tokio::fs::read(dir.path().join("forum.json")).await.unwrap();

    let err = worker.run_tick().await.unwrap_err();
    assert!(matches!(err, Error::Fetch(FetchError::Timeout)));

    let after = tokio::fs::read(dir.path().join("forum.json")).await.unwrap();
    assert_eq!(before, after);
}

// ============================================================================
// Storage Error Tests
// ============================================================================

#[tokio::test]
async fn test_corrupt_snapshot_is_reported_and_left_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("forum.json");
    tokio::fs::write(&snapshot, b"[{\"title\": ").await.unwrap();

    let worker = worker_for(&server, &dir, NotificationDispatcher::disabled());
    let err = worker.run_tick().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Persistence(PersistenceError::Corrupt { .. })
    ));
    assert_eq!(err.category(), ErrorCategory::Storage);
    assert_eq!(tokio::fs::read(&snapshot).await.unwrap(), b"[{\"title\": ");
}

#[tokio::test]
async fn test_empty_snapshot_file_is_first_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("forum.json"), b"").await.unwrap();

    let worker = worker_for(&server, &dir, NotificationDispatcher::disabled());
    assert_eq!(worker.run_tick().await.unwrap().new_items.len(), 2);
}

// ============================================================================
// Notification Error Tests
// ============================================================================

#[tokio::test]
async fn test_notification_outage_does_not_fail_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .mount(&server)
        .await;

    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&hook)
        .await;

    let notifier =
        WebhookNotifier::new(WebhookConfig::new(hook.uri()).with_retries(1, 10)).unwrap();
    let dir = TempDir::new().unwrap();
    let worker = worker_for(
        &server,
        &dir,
        NotificationDispatcher::new(Some(Arc::new(notifier))),
    );

    let report = worker.run_tick().await.unwrap();
    assert_eq!(report.new_items.len(), 2);
    assert!(!report.notified);

    // The baseline advanced regardless of delivery
    assert!(worker.run_tick().await.unwrap().new_items.is_empty());
    assert!(worker.status().await.last_error.is_none());
}

// ============================================================================
// Markup Change Tests
// ============================================================================

#[tokio::test]
async fn test_listing_removed_reports_nothing_new() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REDESIGNED_PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let worker = worker_for(&server, &dir, NotificationDispatcher::disabled());

    worker.run_tick().await.unwrap();
    let report = worker.run_tick().await.unwrap();

    assert_eq!(report.total_items, 0);
    assert!(report.new_items.is_empty());
}
