//! Monitor pipeline integration tests
//!
//! Runs real workers against a mock site with the snapshot on disk:
//! 1. First check reports every item
//! 2. Unchanged page reports nothing
//! 3. New post is reported once and notified
//! 4. Snapshot survives a worker restart

use std::sync::Arc;
use std::time::Duration;

use sitewatch::crawler::HttpFetcher;
use sitewatch::monitor::MonitorWorker;
use sitewatch::notifications::{NotificationDispatcher, WebhookConfig, WebhookNotifier};
use sitewatch::storage::decode_snapshot;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{listing_site, manager, wait_for_checks, LISTING_V1, LISTING_V2};

fn fetcher() -> Arc<HttpFetcher> {
    Arc::new(HttpFetcher::with_config(Duration::from_secs(5), "sitewatch-test/1.0", 1 << 20).unwrap())
}

/// Serve V1 for `v1_hits` requests, V2 afterwards
async fn mount_listing(server: &MockServer, v1_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/forum"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .up_to_n_times(v1_hits)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/forum"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V2))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_detects_new_post_across_checks() {
    let server = MockServer::start().await;
    mount_listing(&server, 2).await;
    let dir = TempDir::new().unwrap();

    let site = listing_site("forum", &format!("{}/forum", server.uri()), dir.path());
    let worker = MonitorWorker::new(site, fetcher(), NotificationDispatcher::disabled()).unwrap();

    let first = worker.run_tick().await.unwrap();
    assert_eq!(first.new_items.len(), 2);
    assert_eq!(first.total_items, 2);

    let second = worker.run_tick().await.unwrap();
    assert!(second.new_items.is_empty());

    let third = worker.run_tick().await.unwrap();
    assert_eq!(third.new_items.len(), 1);
    assert_eq!(third.new_items[0].get("title"), Some("Third post"));
    assert_eq!(third.new_items[0].get("url"), Some("/post/3"));

    let status = worker.status().await;
    assert_eq!(status.total_checks, 3);
    assert_eq!(status.updates_count, 3);
    assert!(status.last_error.is_none());

    // Snapshot holds the latest page in document order
    let bytes = tokio::fs::read(dir.path().join("forum.json")).await.unwrap();
    let snapshot = decode_snapshot(&bytes, "forum.json").unwrap();
    let titles: Vec<_> = snapshot.iter().filter_map(|i| i.get("title")).collect();
    assert_eq!(titles, vec!["Third post", "Second post", "First post"]);
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let server = MockServer::start().await;
    mount_listing(&server, 1).await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/forum", server.uri());

    let worker = MonitorWorker::new(
        listing_site("forum", &url, dir.path()),
        fetcher(),
        NotificationDispatcher::disabled(),
    )
    .unwrap();
    worker.run_tick().await.unwrap();
    drop(worker);

    let restarted = MonitorWorker::new(
        listing_site("forum", &url, dir.path()),
        fetcher(),
        NotificationDispatcher::disabled(),
    )
    .unwrap();
    let report = restarted.run_tick().await.unwrap();

    assert_eq!(report.new_items.len(), 1);
    assert_eq!(report.new_items[0].get("title"), Some("Third post"));
}

#[tokio::test]
async fn test_new_post_is_notified_once() {
    let site_server = MockServer::start().await;
    mount_listing(&site_server, 1).await;

    let hook_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&hook_server)
        .await;

    let notifier = WebhookNotifier::new(WebhookConfig::new(format!("{}/hook", hook_server.uri())))
        .unwrap();
    let dispatcher = NotificationDispatcher::new(Some(Arc::new(notifier)));
    let dir = TempDir::new().unwrap();

    let worker = MonitorWorker::new(
        listing_site("forum", &format!("{}/forum", site_server.uri()), dir.path()),
        fetcher(),
        dispatcher,
    )
    .unwrap();

    assert!(worker.run_tick().await.unwrap().notified);
    assert!(worker.run_tick().await.unwrap().notified);
    // Nothing new on the third check, so no third request
    assert!(!worker.run_tick().await.unwrap().notified);

    let requests = hook_server.received_requests().await.unwrap();
    let last: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(last["title"], "forum has 1 updates");
    assert_eq!(last["body"], "Latest updates:\n1. Third post\n   /post/3\n");
}

#[tokio::test]
async fn test_added_monitor_checks_immediately() {
    let server = MockServer::start().await;
    mount_listing(&server, 1).await;
    let dir = TempDir::new().unwrap();

    let manager = manager(NotificationDispatcher::disabled());
    let added = manager
        .add(listing_site("forum", &format!("{}/forum", server.uri()), dir.path()))
        .await
        .unwrap();
    assert!(added.is_running);

    let status = wait_for_checks(&manager, "forum", 1).await;
    assert_eq!(status.updates_count, 2);
    assert!(status.last_check.is_some());
    assert!(status.next_check > status.last_check);
    assert!(dir.path().join("forum.json").exists());

    manager.shutdown_all().await;
    assert!(!manager.status("forum").await.unwrap().is_running);
}
