//! Unified error handling for the sitewatch crate
//!
//! This module consolidates the domain-specific errors from
//! [`crate::utils::error`] into a single `Error` enum, while keeping the
//! domain errors usable on their own.
//!
//! # Architecture
//!
//! - [`SitewatchErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Propagation
//!
//! Configuration errors are fatal where they occur (file load, `add`).
//! Fetch, parse and persistence errors are local to a single monitor tick:
//! they end up in the monitor status and the schedule continues.
//! Notification errors are only logged.

use thiserror::Error;

pub use crate::utils::error::{
    ConfigError, FetchError, NotificationError, ParseError, PersistenceError,
};

/// Common trait for all sitewatch error types
pub trait SitewatchErrorTrait: std::error::Error {
    /// Check if this error is transient (the next tick may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, status)
    Network,
    /// Markup and selector errors
    Parsing,
    /// Snapshot store errors
    Storage,
    /// Notification delivery errors
    Notification,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Notification => "notification",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the sitewatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Page retrieval failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Extraction failed
    #[error("extraction failed: {0}")]
    Parse(#[from] ParseError),

    /// Snapshot load or save failed
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// Notification delivery failed
    #[error("notification failed: {0}")]
    Notification(#[from] NotificationError),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// No monitor registered under this name
    #[error("monitor not found: {0}")]
    NotFound(String),
}

impl SitewatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => !matches!(e, FetchError::InvalidUrl(_)),
            Self::Parse(_) => true, // markup may change by the next tick
            Self::Persistence(e) => !matches!(e, PersistenceError::Corrupt { .. }),
            Self::Notification(_) => true,
            Self::Config(_) => false,
            Self::NotFound(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Parse(_) => ErrorCategory::Parsing,
            Self::Persistence(_) => ErrorCategory::Storage,
            Self::Notification(_) => ErrorCategory::Notification,
            Self::Config(_) => ErrorCategory::Config,
            Self::NotFound(_) => ErrorCategory::Other,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
