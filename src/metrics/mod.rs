//! Prometheus metrics for sitewatch monitors
//!
//! This module provides metrics tracking for:
//! - Checks per site and outcome, with duration
//! - New items discovered per site
//! - Notification delivery failures
//! - Number of running monitors
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all monitor metrics
struct MonitorMetrics {
    checks: CounterVec,
    new_items: CounterVec,
    check_duration: HistogramVec,
    notification_failures: CounterVec,
    active_monitors: Gauge,
}

/// Global storage for monitor metrics
static MONITOR_METRICS: OnceLock<MonitorMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

/// Outcome label of a finished check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Check completed, with or without new items
    Success,
    /// Page retrieval failed
    FetchError,
    /// Extraction failed
    ParseError,
    /// Snapshot load or save failed
    PersistenceError,
}

impl CheckOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::FetchError => "fetch_error",
            Self::ParseError => "parse_error",
            Self::PersistenceError => "persistence_error",
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = sitewatch::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = MonitorMetrics {
        checks: register_counter_vec!(
            "sitewatch_checks_total",
            "Total checks by site and outcome",
            &["site", "outcome"]
        )?,
        new_items: register_counter_vec!(
            "sitewatch_new_items_total",
            "Total new items discovered by site",
            &["site"]
        )?,
        check_duration: register_histogram_vec!(
            "sitewatch_check_duration_seconds",
            "Duration of one check in seconds",
            &["site"],
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        )?,
        notification_failures: register_counter_vec!(
            "sitewatch_notification_failures_total",
            "Total failed notification deliveries by site",
            &["site"]
        )?,
        active_monitors: register_gauge!(
            "sitewatch_active_monitors",
            "Number of monitors currently running"
        )?,
    };

    MONITOR_METRICS
        .set(metrics)
        .map_err(|_| "Monitor metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    MONITOR_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a finished check
pub fn record_check(site: &str, outcome: CheckOutcome, duration_secs: f64, new_items: usize) {
    let Some(m) = MONITOR_METRICS.get() else {
        return;
    };

    m.checks
        .with_label_values(&[site, outcome.as_str()])
        .inc();
    m.check_duration
        .with_label_values(&[site])
        .observe(duration_secs);

    if new_items > 0 {
        m.new_items
            .with_label_values(&[site])
            .inc_by(new_items as f64);
    }
}

/// Record a failed notification delivery
pub fn record_notification_failure(site: &str) {
    if let Some(m) = MONITOR_METRICS.get() {
        m.notification_failures.with_label_values(&[site]).inc();
    }
}

/// Track a monitor starting
pub fn monitor_started() {
    if let Some(m) = MONITOR_METRICS.get() {
        m.active_monitors.inc();
    }
}

/// Track a monitor stopping
pub fn monitor_stopped() {
    if let Some(m) = MONITOR_METRICS.get() {
        m.active_monitors.dec();
    }
}

// ============================================================================
// Tests
// ============================================================================
