//! PushPlus notifier
//!
//! Posts `{token, title, content, channel?}` to the PushPlus send endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::parse_settings;
use crate::notifications::Notifier;
use crate::utils::error::{ConfigError, NotificationError};

/// Public PushPlus send endpoint
pub const DEFAULT_ENDPOINT: &str = "http://www.pushplus.plus/send";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPlusConfig {
    /// User token
    #[serde(default)]
    pub token: String,
    /// Delivery channel, e.g. `wechat`; provider default when absent
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

#[derive(Debug, Serialize)]
struct PushPlusRequest<'a> {
    token: &'a str,
    title: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
}

/// Response envelope; `code` 200 means accepted
#[derive(Debug, Deserialize)]
struct PushPlusResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

pub struct PushPlusNotifier {
    config: PushPlusConfig,
    client: Client,
}

impl PushPlusNotifier {
    pub fn new(config: PushPlusConfig) -> Result<Self, ConfigError> {
        if config.token.trim().is_empty() {
            return Err(ConfigError::Missing("notification.config.token".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ConfigError::invalid("notification", format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Provider constructor
    pub fn from_value(value: &serde_json::Value) -> Result<Arc<dyn Notifier>, ConfigError> {
        let config: PushPlusConfig = parse_settings("pushplus", value)?;
        Ok(Arc::new(Self::new(config)?))
    }
}

#[async_trait]
impl Notifier for PushPlusNotifier {
    fn name(&self) -> &str {
        "pushplus"
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        let request = PushPlusRequest {
            token: &self.config.token,
            title,
            content: format!("{body}\n"),
            channel: self.config.channel.as_deref().filter(|c| !c.is_empty()),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        // The service reports application errors inside a 200 response
        if let Ok(reply) = serde_json::from_str::<PushPlusResponse>(&text) {
            if reply.code != 200 {
                return Err(NotificationError::Rejected {
                    status: u16::try_from(reply.code).unwrap_or(0),
                    body: reply.msg,
                });
            }
        }

        tracing::debug!("PushPlus message accepted");
        Ok(())
    }
}
