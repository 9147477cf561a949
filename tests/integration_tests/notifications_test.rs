//! Notifier integration tests against mock endpoints

use serde_json::json;
use sitewatch::config::NotificationConfig;
use sitewatch::models::ExtractedItem;
use sitewatch::notifications::{
    build_notifier, dispatcher_from_config, Notifier, PushPlusConfig, PushPlusNotifier,
    WebhookConfig, WebhookNotifier,
};
use sitewatch::utils::error::NotificationError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_webhook_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig::new(server.uri()).with_retries(3, 10);
    let notifier = WebhookNotifier::new(config).unwrap();

    notifier.send("forum has 1 updates", "Latest updates:\n").await.unwrap();
}

#[tokio::test]
async fn test_webhook_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig::new(server.uri()).with_retries(3, 10);
    let notifier = WebhookNotifier::new(config).unwrap();

    let err = notifier.send("t", "b").await.unwrap_err();
    match err {
        NotificationError::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_webhook_sends_auth_and_custom_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("authorization", "Bearer secret"))
        .and(header("x-source", "sitewatch"))
        .and(body_partial_json(json!({"title": "forum has 2 updates"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig::new(format!("{}/hook", server.uri()))
        .with_auth_token("secret")
        .with_header("x-source", "sitewatch");
    let notifier = WebhookNotifier::new(config).unwrap();

    notifier.send("forum has 2 updates", "body").await.unwrap();
}

#[tokio::test]
async fn test_pushplus_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_partial_json(json!({
            "token": "tok",
            "title": "forum has 1 updates",
            "content": "Latest updates:\n1. A\n   /a\n\n",
            "channel": "wechat"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "msg": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = PushPlusNotifier::new(PushPlusConfig {
        token: "tok".into(),
        channel: Some("wechat".into()),
        endpoint: format!("{}/send", server.uri()),
    })
    .unwrap();

    notifier
        .send("forum has 1 updates", "Latest updates:\n1. A\n   /a\n")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_pushplus_application_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 903, "msg": "invalid token"})),
        )
        .mount(&server)
        .await;

    let notifier = PushPlusNotifier::new(PushPlusConfig {
        token: "tok".into(),
        channel: None,
        endpoint: server.uri(),
    })
    .unwrap();

    let err = notifier.send("t", "b").await.unwrap_err();
    assert!(matches!(err, NotificationError::Rejected { status: 903, .. }));
}

#[tokio::test]
async fn test_dispatcher_from_config_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"title": "blog has 2 updates"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = NotificationConfig {
        service: "webhook".into(),
        config: json!({ "url": server.uri(), "max_retries": 0 }),
    };
    let dispatcher = dispatcher_from_config(Some(&config)).unwrap();
    assert_eq!(dispatcher.provider(), Some("webhook"));

    let items = vec![
        ExtractedItem::new().with("title", "Post B").with("url", "/b"),
        ExtractedItem::new().with("title", "Post A").with("url", "/a"),
    ];
    assert!(dispatcher.notify("blog", &items).await.unwrap());
    assert!(!dispatcher.notify("blog", &[]).await.unwrap());
}

#[test]
fn test_build_notifier_rejects_bad_settings() {
    assert!(build_notifier("pushplus", &json!({})).is_err());
    assert!(build_notifier("webhook", &json!({"url": "ftp://x"})).is_err());
    assert!(build_notifier("smoke-signal", &json!({})).is_err());
    assert!(build_notifier("log", &serde_json::Value::Null).is_ok());
}
