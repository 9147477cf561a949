//! Test fixtures for integration tests
//!
//! Provides sample listing pages and helpers for wiring monitors to
//! mock servers

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sitewatch::config::SiteDefinition;
use sitewatch::crawler::HttpFetcher;
use sitewatch::models::{ExtractionSchema, FieldSpec, MonitorStatus};
use sitewatch::monitor::{MonitorManager, StatusRegistry};
use sitewatch::notifications::NotificationDispatcher;

/// Listing with two posts
pub const LISTING_V1: &str = r#"
<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Forum</title></head>
<body>
  <ul class="posts">
    <li><a class="title" href="/post/2">Second post</a></li>
    <li><a class="title" href="/post/1">First post</a></li>
  </ul>
</body>
</html>
"#;

/// Same listing after one new post was published
pub const LISTING_V2: &str = r#"
<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Forum</title></head>
<body>
  <ul class="posts">
    <li><a class="title" href="/post/3">Third post</a></li>
    <li><a class="title" href="/post/2">Second post</a></li>
    <li><a class="title" href="/post/1">First post</a></li>
  </ul>
</body>
</html>
"#;

/// Page that no longer has the listing container
pub const REDESIGNED_PAGE: &str = r#"
<html><body><div class="feed"><article>Moved</article></div></body></html>
"#;

pub fn listing_schema() -> ExtractionSchema {
    ExtractionSchema::new(
        "ul.posts",
        Some("li"),
        vec![
            FieldSpec::text("title", "a.title"),
            FieldSpec::attribute("url", "a.title", "href"),
        ],
    )
}

/// Site watching `url` with its snapshot inside `dir`
pub fn listing_site(name: &str, url: &str, dir: &std::path::Path) -> SiteDefinition {
    SiteDefinition::new(name, url, listing_schema())
        .with_storage(dir.join(format!("{name}.json")).to_string_lossy())
        .with_check_interval(3600)
}

pub fn manager(dispatcher: NotificationDispatcher) -> Arc<MonitorManager> {
    let fetcher = HttpFetcher::with_config(Duration::from_secs(5), "sitewatch-test/1.0", 1 << 20)
        .expect("fetcher");
    Arc::new(MonitorManager::new(
        Arc::new(StatusRegistry::new()),
        Arc::new(fetcher),
        dispatcher,
    ))
}

/// Poll a monitor until it completed `checks` ticks
pub async fn wait_for_checks(manager: &MonitorManager, name: &str, checks: u64) -> MonitorStatus {
    for _ in 0..200 {
        let status = manager.status(name).await.expect("monitor registered");
        if status.total_checks >= checks {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("monitor '{name}' did not complete {checks} checks in time");
}
