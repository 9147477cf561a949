//! Notifier that writes messages to the log

use async_trait::async_trait;
use std::sync::Arc;

use crate::notifications::Notifier;
use crate::utils::error::{ConfigError, NotificationError};

#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    /// Provider constructor; takes no settings
    pub fn from_value(_value: &serde_json::Value) -> Result<Arc<dyn Notifier>, ConfigError> {
        Ok(Arc::new(Self))
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        tracing::info!(title, body, "Notification");
        Ok(())
    }
}
