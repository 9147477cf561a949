//! Webhook notifier
//!
//! This module provides a notifier that posts messages as JSON to an HTTP
//! endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::parse_settings;
use crate::notifications::Notifier;
use crate::utils::error::{ConfigError, NotificationError};

/// Webhook notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Optional authentication token (sent as Bearer token)
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Custom headers to include in requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retry attempts on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each attempt
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            headers: HashMap::new(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_backoff_ms: default_backoff_ms(),
        }
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set max retries and the initial backoff
    pub fn with_retries(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::Missing("notification.config.url".to_string()));
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "notification.config.url",
                "must start with http:// or https://",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "notification.config.timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Webhook notifier
///
/// # Payload Format
///
/// ```json
/// {
///   "title": "forum has 2 updates",
///   "body": "Latest updates:\n1. ...",
///   "timestamp": "2024-01-01T12:00:00Z"
/// }
/// ```
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    /// Create a new webhook notifier
    pub fn new(config: WebhookConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::invalid("notification", format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Provider constructor
    pub fn from_value(value: &serde_json::Value) -> Result<Arc<dyn Notifier>, ConfigError> {
        let config: WebhookConfig = parse_settings("webhook", value)?;
        Ok(Arc::new(Self::new(config)?))
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn build_payload(title: &str, body: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "body": body,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }

    /// One POST of the payload
    async fn post_once(&self, payload: &serde_json::Value) -> Result<(), NotificationError> {
        let mut request = self.client.post(&self.config.url).json(payload);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(url = %self.config.url, %status, "Webhook delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotificationError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base...
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << (retry - 1).min(16);
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(factor))
    }

    /// Post with bounded retries; 4xx rejections are final
    async fn send_with_retry(&self, payload: &serde_json::Value) -> Result<(), NotificationError> {
        let mut retry = 0;
        loop {
            let err = match self.post_once(payload).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            let permanent = matches!(
                err,
                NotificationError::Rejected { status, .. } if (400..500).contains(&status)
            );
            if permanent || retry >= self.config.max_retries {
                return Err(err);
            }

            retry += 1;
            tracing::debug!(
                url = %self.config.url,
                error = %err,
                retry,
                max_retries = self.config.max_retries,
                "Webhook delivery failed, retrying"
            );
            tokio::time::sleep(self.backoff(retry)).await;
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        let payload = Self::build_payload(title, body);
        self.send_with_retry(&payload).await
    }
}
