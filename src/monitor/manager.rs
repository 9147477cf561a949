//! Monitor lifecycle operations
//!
//! [`MonitorManager`] is the surface the control plane and the CLI use:
//! add, remove, start, stop and status queries, all keyed by site name.

use futures::future::join_all;
use std::sync::Arc;

use crate::config::SiteDefinition;
use crate::crawler::PageFetcher;
use crate::error::{Error, Result};
use crate::models::MonitorStatus;
use crate::monitor::handle::{LifecycleOutcome, MonitorHandle};
use crate::monitor::registry::StatusRegistry;
use crate::monitor::worker::MonitorWorker;
use crate::notifications::NotificationDispatcher;

/// Builds workers and drives their lifecycle through the registry
pub struct MonitorManager {
    registry: Arc<StatusRegistry>,
    fetcher: Arc<dyn PageFetcher>,
    dispatcher: NotificationDispatcher,
}

impl MonitorManager {
    pub fn new(
        registry: Arc<StatusRegistry>,
        fetcher: Arc<dyn PageFetcher>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            registry,
            fetcher,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<StatusRegistry> {
        &self.registry
    }

    /// Build a worker for a site with the shared fetcher and dispatcher
    pub fn build_worker(&self, site: SiteDefinition) -> Result<MonitorWorker> {
        Ok(MonitorWorker::new(
            site,
            Arc::clone(&self.fetcher),
            self.dispatcher.clone(),
        )?)
    }

    /// Validate, register and start a new monitor
    ///
    /// # Errors
    ///
    /// `Error::Config` for an invalid definition or a name already in use
    pub async fn add(&self, site: SiteDefinition) -> Result<MonitorStatus> {
        let worker = self.build_worker(site)?;
        self.add_worker(worker).await
    }

    /// Register and start a prepared worker
    pub async fn add_worker(&self, worker: MonitorWorker) -> Result<MonitorStatus> {
        let handle = Arc::new(MonitorHandle::new(worker));
        self.registry.try_register(Arc::clone(&handle)).await?;
        handle.start().await;
        Ok(handle.status().await)
    }

    /// Stop and unregister a monitor, returning its final status
    pub async fn remove(&self, name: &str) -> Result<MonitorStatus> {
        let handle = self
            .registry
            .unregister(name)
            .await
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        handle.stop().await;
        Ok(handle.status().await)
    }

    pub async fn start(&self, name: &str) -> Result<LifecycleOutcome> {
        Ok(self.handle(name).await?.start().await)
    }

    pub async fn stop(&self, name: &str) -> Result<LifecycleOutcome> {
        Ok(self.handle(name).await?.stop().await)
    }

    pub async fn status(&self, name: &str) -> Result<MonitorStatus> {
        Ok(self.handle(name).await?.status().await)
    }

    /// Status of every monitor, sorted by name
    pub async fn list(&self) -> Vec<MonitorStatus> {
        self.registry.list().await
    }

    /// Stop every running monitor and wait for all of them
    pub async fn shutdown_all(&self) {
        let handles = self.registry.handles().await;
        let count = handles.len();

        join_all(handles.iter().map(|h| h.stop())).await;
        tracing::info!(monitors = count, "All monitors stopped");
    }

    async fn handle(&self, name: &str) -> Result<Arc<MonitorHandle>> {
        self.registry
            .get(name)
            .await
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }
}
