//! Registry of active monitors
//!
//! Maps site names to [`MonitorHandle`]s. The registry lock guards only the
//! map; each monitor's status has its own lock, which is never taken while
//! the registry lock is held.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::MonitorStatus;
use crate::monitor::handle::MonitorHandle;
use crate::utils::error::ConfigError;

/// Process-wide directory of monitors, shared by `Arc`
#[derive(Debug, Default)]
pub struct StatusRegistry {
    monitors: RwLock<HashMap<String, Arc<MonitorHandle>>>,
}

impl StatusRegistry {
    /// Create a new registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handle, replacing and returning any entry with the same name.
    ///
    /// A replaced handle keeps running until its owner stops it.
    pub async fn register(&self, handle: Arc<MonitorHandle>) -> Option<Arc<MonitorHandle>> {
        let name = handle.name().to_string();
        let previous = self.monitors.write().await.insert(name.clone(), handle);

        if previous.is_some() {
            tracing::info!(site = %name, "Monitor replaced in registry");
        } else {
            tracing::info!(site = %name, "Monitor registered");
        }
        previous
    }

    /// Insert a handle unless its name or snapshot location is taken
    pub async fn try_register(&self, handle: Arc<MonitorHandle>) -> Result<(), ConfigError> {
        let mut monitors = self.monitors.write().await;
        let name = handle.name();

        if monitors.contains_key(name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }

        let path = handle.site().storage_path();
        if let Some(owner) = monitors.values().find(|h| h.site().storage_path() == path) {
            tracing::warn!(
                site = %name,
                owner = %owner.name(),
                path = %path.display(),
                "Snapshot location already in use"
            );
            return Err(ConfigError::DuplicateStorage(path.display().to_string()).for_site(name));
        }

        tracing::info!(site = %name, "Monitor registered");
        monitors.insert(name.to_string(), handle);
        Ok(())
    }

    /// Remove an entry
    pub async fn unregister(&self, name: &str) -> Option<Arc<MonitorHandle>> {
        let removed = self.monitors.write().await.remove(name);
        if removed.is_some() {
            tracing::info!(site = %name, "Monitor unregistered");
        }
        removed
    }

    pub async fn get(&self, name: &str) -> Option<Arc<MonitorHandle>> {
        self.monitors.read().await.get(name).cloned()
    }

    /// Status of one monitor
    pub async fn status(&self, name: &str) -> Option<MonitorStatus> {
        let handle = self.get(name).await?;
        Some(handle.status().await)
    }

    /// All handles, in no particular order
    pub async fn handles(&self) -> Vec<Arc<MonitorHandle>> {
        self.monitors.read().await.values().cloned().collect()
    }

    /// Status of every monitor, sorted by name
    pub async fn list(&self) -> Vec<MonitorStatus> {
        let handles = self.handles().await;

        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            statuses.push(handle.status().await);
        }
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.monitors.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.monitors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.monitors.read().await.is_empty()
    }
}
