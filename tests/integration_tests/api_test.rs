//! Control plane API tests
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sitewatch::monitor::MonitorManager;
use sitewatch::notifications::NotificationDispatcher;
use sitewatch::server::{create_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{manager, wait_for_checks, LISTING_V1};

fn router(manager: &Arc<MonitorManager>) -> Router {
    create_router(AppState {
        manager: Arc::clone(manager),
        start_time: Instant::now(),
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn site_json(name: &str, url: &str, dir: &TempDir) -> Value {
    json!({
        "name": name,
        "url": url,
        "storage": dir.path().join(format!("{name}.json")),
        "check_interval": 3600,
        "selectors": {
            "container": "ul.posts",
            "item": "li",
            "fields": [
                { "name": "title", "selector": "a.title" },
                { "name": "url", "selector": "a.title", "type": "attr", "attr": "href" }
            ]
        }
    })
}

async fn site_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_V1))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_health() {
    let manager = manager(NotificationDispatcher::disabled());
    let (status, body) = send(&router(&manager), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["monitors"], 0);
}

#[tokio::test]
async fn test_monitor_lifecycle() {
    let server = site_server().await;
    let dir = TempDir::new().unwrap();
    let manager = manager(NotificationDispatcher::disabled());
    let app = router(&manager);

    let (status, body) = send(
        &app,
        post_json("/api/v1/monitors", &site_json("forum", &server.uri(), &dir)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "forum");
    assert_eq!(body["data"]["is_running"], true);

    wait_for_checks(&manager, "forum", 1).await;

    let (status, body) = send(&app, get("/api/v1/monitors/forum")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updates_count"], 2);
    assert_eq!(body["data"]["check_interval_secs"], 3600);

    let (status, body) = send(&app, post("/api/v1/monitors/forum/start")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "already_running");

    let (status, body) = send(&app, post("/api/v1/monitors/forum/stop")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "stopped");

    let (_, body) = send(&app, post("/api/v1/monitors/forum/stop")).await;
    assert_eq!(body["data"], "already_stopped");

    let (_, body) = send(&app, get("/api/v1/monitors")).await;
    assert_eq!(body["data"][0]["is_running"], false);

    let (status, _) = send(
        &app,
        Request::delete("/api/v1/monitors/forum")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/v1/monitors/forum")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_list_is_sorted_by_name() {
    let server = site_server().await;
    let dir = TempDir::new().unwrap();
    let manager = manager(NotificationDispatcher::disabled());
    let app = router(&manager);

    for name in ["zeta", "alpha", "mid"] {
        let (status, _) = send(
            &app,
            post_json("/api/v1/monitors", &site_json(name, &server.uri(), &dir)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, get("/api/v1/monitors")).await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_add_rejects_duplicates_and_invalid_sites() {
    let server = site_server().await;
    let dir = TempDir::new().unwrap();
    let manager = manager(NotificationDispatcher::disabled());
    let app = router(&manager);

    let site = site_json("forum", &server.uri(), &dir);
    let (status, _) = send(&app, post_json("/api/v1/monitors", &site)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, post_json("/api/v1/monitors", &site)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let mut mirror = site_json("forum-mirror", &server.uri(), &dir);
    mirror["storage"] = site["storage"].clone();
    let (status, body) = send(&app, post_json("/api/v1/monitors", &mirror)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("forum.json"));

    let mut invalid = site_json("broken", &server.uri(), &dir);
    invalid["selectors"]["container"] = json!("ul[");
    let (status, body) = send(&app, post_json("/api/v1/monitors", &invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("broken"));

    // Rejected definitions leave no trace in the registry
    let (_, body) = send(&app, get("/api/v1/monitors")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_unknown_monitor_is_not_found() {
    let manager = manager(NotificationDispatcher::disabled());
    let app = router(&manager);

    for request in [
        get("/api/v1/monitors/ghost"),
        post("/api/v1/monitors/ghost/start"),
        post("/api/v1/monitors/ghost/stop"),
    ] {
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
