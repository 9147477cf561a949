//! Error types for the sitewatch monitor engine
//!
//! This module defines the domain error types used throughout the application.
//! Each one maps to a single failure class of a monitor tick or of
//! configuration loading.

use thiserror::Error;

/// Errors that can occur while retrieving a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("HTTP {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur while turning markup into items
#[derive(Error, Debug)]
pub enum ParseError {
    /// A CSS selector in the schema could not be compiled
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Markup could not be parsed into a document
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),
}

/// Errors raised by a snapshot store
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Read failure
    #[error("Failed to read snapshot {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Write failure
    #[error("Failed to write snapshot {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not a valid snapshot
    #[error("Corrupt snapshot {location}: {reason}")]
    Corrupt { location: String, reason: String },

    /// Snapshot could not be serialized
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised while delivering a notification
#[derive(Error, Debug)]
pub enum NotificationError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic delivery failure
    #[error("Delivery failed: {0}")]
    Other(String),
}

/// Errors in site definitions or process configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field has an invalid value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Required field missing or empty
    #[error("Missing required field '{0}'")]
    Missing(String),

    /// A site with this name already exists
    #[error("Duplicate site name '{0}'")]
    DuplicateName(String),

    /// Another site already writes its snapshot to this location
    #[error("Snapshot location '{0}' is used by more than one site")]
    DuplicateStorage(String),

    /// Notifier provider name is not in the provider table
    #[error("Unregistered notification provider '{0}'")]
    UnknownProvider(String),

    /// Transform name is not in the transform table
    #[error("Unknown transform '{0}'")]
    UnknownTransform(String),

    /// Error scoped to a site definition
    #[error("Site '{site}': {source}")]
    Site {
        site: String,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the offending site name
    pub fn for_site(self, site: impl Into<String>) -> Self {
        Self::Site {
            site: site.into(),
            source: Box::new(self),
        }
    }
}
