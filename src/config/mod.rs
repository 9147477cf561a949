//! Configuration management for sitewatch
//!
//! This module handles loading and validating configuration from JSON or
//! TOML files and environment variable overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::crawler::fetcher::{DEFAULT_MAX_BODY_BYTES, DEFAULT_USER_AGENT};
use crate::models::ExtractionSchema;
use crate::notifications::is_known_provider;
use crate::parser::{compile_selector, TransformRegistry};
use crate::utils::error::ConfigError;
use crate::utils::sanitize_filename;

/// Interval used when a site declares `check_interval = 0`
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Control plane HTTP API
    #[serde(default)]
    pub web: WebConfig,

    /// Notifier provider; absent disables notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationConfig>,

    /// Page fetcher settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Monitored sites
    #[serde(default)]
    pub sites: Vec<SiteDefinition>,
}

/// Control plane configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Serve the HTTP API
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Listen address; `:8080` binds all interfaces
    #[serde(default = "default_bind_address", alias = "port")]
    pub bind_address: String,

    /// Allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// Notifier selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Provider name, e.g. `pushplus`
    pub service: String,

    /// Provider-specific settings
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Page fetcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Response bodies are truncated past this size
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// One monitored site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDefinition {
    /// Unique site name
    pub name: String,

    /// Page to watch
    pub url: String,

    /// Snapshot file; empty means `data/<name>.json`
    #[serde(default, alias = "storage_path")]
    pub storage: String,

    /// Extraction schema
    pub selectors: ExtractionSchema,

    /// Seconds between checks; 0 selects the default
    #[serde(default)]
    pub check_interval: i64,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    String::from("0.0.0.0:8080")
}

fn default_cors_origins() -> Vec<String> {
    vec![String::from("http://localhost:5173")]
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("text")
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_bind_address(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl WebConfig {
    /// Bind address with a bare `:port` expanded to all interfaces
    pub fn socket_address(&self) -> String {
        if self.bind_address.starts_with(':') {
            format!("0.0.0.0{}", self.bind_address)
        } else {
            self.bind_address.clone()
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl FetcherConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load, apply environment overrides, and validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env();
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// `.toml` files are parsed as TOML, anything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config: Self = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))?
        };

        Ok(config)
    }

    /// Apply `SITEWATCH_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("SITEWATCH_BIND_ADDRESS") {
            self.web.bind_address = addr;
        }
        if let Some(level) = lookup("SITEWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SITEWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(ua) = lookup("SITEWATCH_USER_AGENT") {
            self.fetcher.user_agent = ua;
        }
        if let Some(secs) = lookup("SITEWATCH_REQUEST_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            self.fetcher.timeout_secs = secs;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.sites.is_empty() && !self.web.enabled {
            return Err(ConfigError::Missing("sites".to_string()));
        }

        if self.fetcher.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "fetcher.timeout_secs",
                "must be greater than 0",
            ));
        }

        if let Some(notification) = &self.notification {
            if !is_known_provider(&notification.service) {
                return Err(ConfigError::UnknownProvider(notification.service.clone()));
            }
        }

        let transforms = TransformRegistry::builtin();
        let mut names = HashSet::new();
        let mut locations = HashSet::new();
        for site in &self.sites {
            site.validate(transforms)?;
            if !names.insert(site.name.as_str()) {
                return Err(ConfigError::DuplicateName(site.name.clone()));
            }
            let path = site.storage_path();
            if !locations.insert(path.clone()) {
                return Err(
                    ConfigError::DuplicateStorage(path.display().to_string()).for_site(&site.name)
                );
            }
        }

        Ok(())
    }

    /// Find a site by name
    pub fn site(&self, name: &str) -> Option<&SiteDefinition> {
        self.sites.iter().find(|s| s.name == name)
    }
}

impl SiteDefinition {
    /// Create a site definition
    pub fn new(name: impl Into<String>, url: impl Into<String>, selectors: ExtractionSchema) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            storage: String::new(),
            selectors,
            check_interval: 0,
        }
    }

    /// Set the snapshot location
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = storage.into();
        self
    }

    /// Set the interval in seconds
    pub fn with_check_interval(mut self, secs: i64) -> Self {
        self.check_interval = secs;
        self
    }

    /// Validate a site against a transform table
    ///
    /// Errors are wrapped with the site name.
    pub fn validate(&self, transforms: &TransformRegistry) -> std::result::Result<(), ConfigError> {
        self.validate_inner(transforms)
            .map_err(|e| e.for_site(if self.name.is_empty() { "<unnamed>" } else { &self.name }))
    }

    fn validate_inner(&self, transforms: &TransformRegistry) -> std::result::Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Missing("name".to_string()));
        }

        let url = Url::parse(&self.url).map_err(|e| ConfigError::invalid("url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::invalid(
                "url",
                format!("'{}' is not an absolute http(s) URL", self.url),
            ));
        }

        if self.check_interval < 0 {
            return Err(ConfigError::invalid(
                "check_interval",
                "must not be negative",
            ));
        }

        let schema = &self.selectors;
        if schema.container.trim().is_empty() {
            return Err(ConfigError::Missing("selectors.container".to_string()));
        }
        compile_selector(&schema.container)
            .map_err(|e| ConfigError::invalid("selectors.container", e.to_string()))?;
        if let Some(item) = schema.item_selector() {
            compile_selector(item)
                .map_err(|e| ConfigError::invalid("selectors.item", e.to_string()))?;
        }

        let mut field_names = HashSet::new();
        for (i, field) in schema.fields.iter().enumerate() {
            let label = format!("selectors.fields[{i}]");
            if field.name.trim().is_empty() {
                return Err(ConfigError::Missing(format!("{label}.name")));
            }
            if field.selector.trim().is_empty() {
                return Err(ConfigError::Missing(format!("{label}.selector")));
            }
            compile_selector(&field.selector)
                .map_err(|e| ConfigError::invalid(format!("{label}.selector"), e.to_string()))?;
            if let Some(transform) = field.transform.as_deref().filter(|t| !t.is_empty()) {
                if !transforms.contains(transform) {
                    return Err(ConfigError::UnknownTransform(transform.to_string()));
                }
            }
            if !field_names.insert(field.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("{label}.name"),
                    format!("duplicate field name '{}'", field.name),
                ));
            }
        }

        Ok(())
    }

    /// Resolved check interval
    pub fn check_interval(&self) -> Duration {
        match u64::try_from(self.check_interval) {
            Ok(0) | Err(_) => DEFAULT_CHECK_INTERVAL,
            Ok(secs) => Duration::from_secs(secs),
        }
    }

    /// Resolved snapshot path
    pub fn storage_path(&self) -> PathBuf {
        if self.storage.trim().is_empty() {
            PathBuf::from("data").join(format!("{}.json", sanitize_filename(&self.name)))
        } else {
            PathBuf::from(&self.storage)
        }
    }
}
