//! Notification delivery
//!
//! A monitor that discovers new items hands them to the
//! [`NotificationDispatcher`], which formats one combined message and
//! forwards it to the configured [`Notifier`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │    NotificationDispatcher    │
//! │  - Message formatting        │
//! │  - No-op when unconfigured   │
//! └──────────────────────────────┘
//!                │
//!     ┌──────────┼──────────┐
//!     ▼          ▼          ▼
//! ┌────────┐ ┌─────────┐ ┌─────┐
//! │PushPlus│ │ Webhook │ │ Log │
//! └────────┘ └─────────┘ └─────┘
//! ```
//!
//! Providers are selected by name at startup through the static
//! [`PROVIDERS`] table; an unknown name is a configuration error.

pub mod channels;
pub mod dispatcher;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::NotificationConfig;
use crate::utils::error::{ConfigError, NotificationError};

// Re-exports
pub use channels::log::LogNotifier;
pub use channels::pushplus::{PushPlusConfig, PushPlusNotifier};
pub use channels::webhook::{WebhookConfig, WebhookNotifier};
pub use dispatcher::NotificationDispatcher;

/// Delivers a titled text message to a person
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Send one message
    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError>;
}

/// Builds a notifier from its provider-specific settings
pub type ProviderConstructor = fn(&serde_json::Value) -> Result<Arc<dyn Notifier>, ConfigError>;

/// Registered notifier providers
pub static PROVIDERS: &[(&str, ProviderConstructor)] = &[
    ("pushplus", PushPlusNotifier::from_value),
    ("webhook", WebhookNotifier::from_value),
    ("log", LogNotifier::from_value),
];

/// Whether a provider name is registered
pub fn is_known_provider(service: &str) -> bool {
    PROVIDERS.iter().any(|(name, _)| *name == service)
}

/// Registered provider names
pub fn provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|(name, _)| *name).collect()
}

/// Construct the notifier for a provider name
///
/// # Errors
///
/// `ConfigError::UnknownProvider` for an unregistered name, or the
/// provider's own error for invalid settings
pub fn build_notifier(
    service: &str,
    config: &serde_json::Value,
) -> Result<Arc<dyn Notifier>, ConfigError> {
    let (_, constructor) = PROVIDERS
        .iter()
        .find(|(name, _)| *name == service)
        .ok_or_else(|| ConfigError::UnknownProvider(service.to_string()))?;

    let notifier = constructor(config)?;
    tracing::info!(provider = service, "Notifier initialized");
    Ok(notifier)
}

/// Build the dispatcher for an optional `notification` config section
pub fn dispatcher_from_config(
    config: Option<&NotificationConfig>,
) -> Result<NotificationDispatcher, ConfigError> {
    match config {
        Some(c) => Ok(NotificationDispatcher::new(Some(build_notifier(
            &c.service, &c.config,
        )?))),
        None => {
            tracing::info!("No notifier configured, notifications disabled");
            Ok(NotificationDispatcher::disabled())
        }
    }
}
