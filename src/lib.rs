//! sitewatch - Web page change monitor
//!
//! Periodically fetches configured pages, extracts structured items with CSS
//! selectors, compares them with the last stored snapshot and notifies about
//! items that were not seen before.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration loading, site definitions and validation
//! - [`crawler`] - Page retrieval over HTTP
//! - [`parser`] - Selector-based item extraction and value transforms
//! - [`models`] - Core data structures and types
//! - [`storage`] - Per-site snapshot persistence
//! - [`monitor`] - Diff engine, workers, lifecycle control and status registry
//! - [`notifications`] - Message formatting and notifier providers
//! - [`server`] - HTTP control plane
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and domain errors
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sitewatch::config::Config;
//! use sitewatch::crawler::HttpFetcher;
//! use sitewatch::monitor::{MonitorManager, StatusRegistry};
//! use sitewatch::notifications::dispatcher_from_config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.json".as_ref())?;
//!     let manager = MonitorManager::new(
//!         Arc::new(StatusRegistry::new()),
//!         Arc::new(HttpFetcher::from_config(&config.fetcher)?),
//!         dispatcher_from_config(config.notification.as_ref())?,
//!     );
//!     for site in config.sites {
//!         manager.add(site).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod notifications;
pub mod parser;
pub mod server;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, SiteDefinition};
    pub use crate::crawler::{HttpFetcher, PageFetcher};
    pub use crate::error::{Error, ErrorCategory, Result, SitewatchErrorTrait};
    pub use crate::models::{ExtractedItem, ExtractionSchema, FieldSpec, MonitorStatus};
    pub use crate::monitor::{MonitorManager, MonitorWorker, StatusRegistry};
    pub use crate::notifications::{NotificationDispatcher, Notifier};
    pub use crate::storage::{FileSnapshotStore, SnapshotStore};
}

// Direct re-exports for convenience
pub use models::{ExtractedItem, ExtractionSchema, FieldSpec, MonitorStatus};
