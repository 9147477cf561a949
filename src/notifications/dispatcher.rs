//! Combines a batch of new items into one message

use std::fmt::Write as _;
use std::sync::Arc;

use super::Notifier;
use crate::models::ExtractedItem;
use crate::utils::error::NotificationError;

/// Formats new items and forwards them to the configured notifier
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { notifier }
    }

    /// Dispatcher that never sends anything
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Provider name of the configured notifier
    pub fn provider(&self) -> Option<&str> {
        self.notifier.as_deref().map(|n| n.name())
    }

    /// Build the title and body for a batch of new items.
    ///
    /// Items lacking `title` or `url` render those parts empty.
    pub fn format_message(site: &str, items: &[ExtractedItem]) -> (String, String) {
        let title = format!("{site} has {} updates", items.len());

        let mut body = String::from("Latest updates:\n");
        for (i, item) in items.iter().enumerate() {
            let _ = write!(
                body,
                "{}. {}\n   {}\n",
                i + 1,
                item.get("title").unwrap_or_default(),
                item.get("url").unwrap_or_default()
            );
        }

        (title, body)
    }

    /// Send one combined notification.
    ///
    /// Returns `Ok(false)` when nothing was sent: no notifier is configured
    /// or `items` is empty.
    pub async fn notify(
        &self,
        site: &str,
        items: &[ExtractedItem],
    ) -> Result<bool, NotificationError> {
        let Some(notifier) = &self.notifier else {
            return Ok(false);
        };
        if items.is_empty() {
            return Ok(false);
        }

        let (title, body) = Self::format_message(site, items);
        notifier.send(&title, &body).await?;

        tracing::info!(
            site,
            provider = notifier.name(),
            items = items.len(),
            "Notification sent"
        );
        Ok(true)
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("provider", &self.provider())
            .finish()
    }
}
