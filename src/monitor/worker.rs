//! Per-site monitor worker
//!
//! One worker owns one site: every tick it fetches the page, extracts
//! items, diffs them against the stored snapshot, persists the new
//! snapshot and dispatches a notification for new items.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;

use crate::config::SiteDefinition;
use crate::crawler::PageFetcher;
use crate::error::{Error, ErrorCategory, Result, SitewatchErrorTrait};
use crate::metrics::{self, CheckOutcome};
use crate::models::{ExtractedItem, MonitorStatus};
use crate::monitor::diff::diff;
use crate::notifications::NotificationDispatcher;
use crate::parser::{Extractor, TransformRegistry};
use crate::storage::{decode_snapshot, encode_snapshot, FileSnapshotStore, SnapshotStore};
use crate::utils::error::ConfigError;

/// Result of one successful check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    /// Items not present in the previous snapshot
    pub new_items: Vec<ExtractedItem>,
    /// Items in the new snapshot
    pub total_items: usize,
    /// Whether a notification was delivered
    pub notified: bool,
}

/// Drives periodic checks of one site
pub struct MonitorWorker {
    site: SiteDefinition,
    interval: Duration,
    extractor: Extractor,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn SnapshotStore>,
    dispatcher: NotificationDispatcher,
    status: Arc<RwLock<MonitorStatus>>,
}

impl MonitorWorker {
    /// Build a worker for a site, storing its snapshot at the site's
    /// storage path
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the site definition is invalid
    pub fn new(
        site: SiteDefinition,
        fetcher: Arc<dyn PageFetcher>,
        dispatcher: NotificationDispatcher,
    ) -> std::result::Result<Self, ConfigError> {
        let transforms = TransformRegistry::builtin();
        site.validate(transforms)?;

        let extractor = Extractor::with_transforms(&site.selectors, transforms.clone())
            .map_err(|e| ConfigError::invalid("selectors", e.to_string()).for_site(&site.name))?;
        let interval = site.check_interval();
        let store: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new(site.storage_path()));
        let status = MonitorStatus::new(&site.name, &site.url, interval);

        Ok(Self {
            site,
            interval,
            extractor,
            fetcher,
            store,
            dispatcher,
            status: Arc::new(RwLock::new(status)),
        })
    }

    /// Replace the snapshot store
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = store;
        self
    }

    /// Override the check interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self.status = Arc::new(RwLock::new(MonitorStatus::new(
            &self.site.name,
            &self.site.url,
            interval,
        )));
        self
    }

    pub fn name(&self) -> &str {
        &self.site.name
    }

    pub fn site(&self) -> &SiteDefinition {
        &self.site
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Shared status cell
    pub fn status_cell(&self) -> Arc<RwLock<MonitorStatus>> {
        Arc::clone(&self.status)
    }

    /// Copy of the current status
    pub async fn status(&self) -> MonitorStatus {
        self.status.read().await.clone()
    }

    /// Fetch, extract, diff and persist.
    ///
    /// The snapshot is replaced only after fetch and extraction succeed.
    /// A failed save leaves the previous snapshot in place.
    pub async fn check_for_updates(&self) -> Result<CheckReport> {
        let markup = self.fetcher.fetch(&self.site.url).await?;
        let current = self.extractor.extract(&markup)?;

        let previous = match self.store.load().await? {
            Some(bytes) => decode_snapshot(&bytes, self.store.location())?,
            None => Vec::new(),
        };

        let new_items = diff(&previous, &current);

        let bytes = encode_snapshot(&current)?;
        self.store.save(&bytes).await?;

        Ok(CheckReport {
            new_items,
            total_items: current.len(),
            notified: false,
        })
    }

    /// Run one complete tick and record it in the status
    pub async fn run_tick(&self) -> Result<CheckReport> {
        let name = self.site.name.as_str();
        let started = Instant::now();
        let started_at = Utc::now();
        tracing::debug!(site = name, "Checking for updates");

        let mut result = self.check_for_updates().await;

        if let Ok(report) = &mut result {
            if !report.new_items.is_empty() {
                match self.dispatcher.notify(name, &report.new_items).await {
                    Ok(sent) => report.notified = sent,
                    Err(e) => {
                        metrics::record_notification_failure(name);
                        tracing::warn!(site = name, error = %e, "Notification failed");
                    }
                }
            }
        }

        let elapsed = started.elapsed();
        self.record(&result, started_at, elapsed).await;

        match &result {
            Ok(report) if report.new_items.is_empty() => {
                tracing::info!(
                    site = name,
                    items = report.total_items,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "No new items"
                );
            }
            Ok(report) => {
                tracing::info!(
                    site = name,
                    new_items = report.new_items.len(),
                    items = report.total_items,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "New items found"
                );
                for item in &report.new_items {
                    tracing::debug!(site = name, title = item.get("title").unwrap_or_default(), "New item");
                }
            }
            Err(e) => {
                tracing::warn!(
                    site = name,
                    error = %e,
                    category = %e.category(),
                    recoverable = e.is_recoverable(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Check failed"
                );
            }
        }

        result
    }

    /// The next tick is scheduled from the start of this one, so
    /// `next_check` is `started_at + interval`.
    async fn record(
        &self,
        result: &Result<CheckReport>,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) {
        let now = Utc::now();
        let (outcome, new_count) = match result {
            Ok(report) => (CheckOutcome::Success, report.new_items.len()),
            Err(e) => (outcome_of(e), 0),
        };
        metrics::record_check(&self.site.name, outcome, elapsed.as_secs_f64(), new_count);

        let mut status = self.status.write().await;
        status.last_check = Some(now);
        status.last_duration_ms = elapsed.as_millis() as u64;
        status.total_checks += 1;
        status.next_check = chrono::Duration::from_std(self.interval)
            .ok()
            .map(|d| started_at + d);

        match result {
            Ok(report) => {
                status.last_error = None;
                status.consecutive_failures = 0;
                if !report.new_items.is_empty() {
                    status.last_update = Some(now);
                    status.updates_count += report.new_items.len() as u64;
                }
            }
            Err(e) => {
                status.last_error = Some(e.to_string());
                status.consecutive_failures = status.consecutive_failures.saturating_add(1);
            }
        }
    }

    /// Tick loop: first check immediately, then every interval until
    /// `shutdown_rx` changes. A running tick always completes.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        tracing::info!(
            site = %self.site.name,
            interval_secs = self.interval.as_secs(),
            "Monitor started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = interval.tick() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    // Errors are recorded in the status
                    let _ = self.run_tick().await;
                }
            }
        }

        tracing::info!(site = %self.site.name, "Monitor stopped");
    }
}

fn outcome_of(error: &Error) -> CheckOutcome {
    match error.category() {
        ErrorCategory::Network => CheckOutcome::FetchError,
        ErrorCategory::Parsing => CheckOutcome::ParseError,
        _ => CheckOutcome::PersistenceError,
    }
}

impl std::fmt::Debug for MonitorWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorWorker")
            .field("site", &self.site.name)
            .field("interval", &self.interval)
            .field("store", &self.store.location())
            .finish()
    }
}
