//! Control handle of one monitor
//!
//! A [`MonitorHandle`] pairs a worker with its running task. The control
//! plane starts and stops monitors through it; the registry reads status
//! through it. Only the handle changes `is_running`, under its control
//! lock, so the flag always matches the task.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::SiteDefinition;
use crate::metrics;
use crate::models::MonitorStatus;
use crate::monitor::worker::MonitorWorker;

/// Result of an idempotent start or stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOutcome {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyStopped,
}

impl LifecycleOutcome {
    /// Whether the request changed the monitor state
    pub fn changed(&self) -> bool {
        matches!(self, Self::Started | Self::Stopped)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Started => "monitor started",
            Self::AlreadyRunning => "monitor already running",
            Self::Stopped => "monitor stopped",
            Self::AlreadyStopped => "monitor already stopped",
        }
    }
}

impl std::fmt::Display for LifecycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

struct RunningWorker {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owned handle of one monitor
pub struct MonitorHandle {
    worker: Arc<MonitorWorker>,
    status: Arc<RwLock<MonitorStatus>>,
    control: Mutex<Option<RunningWorker>>,
}

impl MonitorHandle {
    pub fn new(worker: MonitorWorker) -> Self {
        let status = worker.status_cell();
        Self {
            worker: Arc::new(worker),
            status,
            control: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.worker.name()
    }

    pub fn site(&self) -> &SiteDefinition {
        self.worker.site()
    }

    pub fn worker(&self) -> &Arc<MonitorWorker> {
        &self.worker
    }

    /// Copy of the current status
    pub async fn status(&self) -> MonitorStatus {
        self.status.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.control
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Spawn the worker task unless it is already running.
    ///
    /// The first check starts immediately.
    pub async fn start(&self) -> LifecycleOutcome {
        let mut control = self.control.lock().await;

        if control.as_ref().is_some_and(|r| !r.task.is_finished()) {
            return LifecycleOutcome::AlreadyRunning;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = Arc::clone(&self.worker);
        let task = tokio::spawn(async move { worker.run(shutdown_rx).await });

        *control = Some(RunningWorker { shutdown, task });
        self.status.write().await.is_running = true;
        metrics::monitor_started();

        LifecycleOutcome::Started
    }

    /// Signal the worker and wait for its task to end.
    ///
    /// An in-flight check finishes before the task exits.
    pub async fn stop(&self) -> LifecycleOutcome {
        let mut control = self.control.lock().await;

        let Some(running) = control.take() else {
            return LifecycleOutcome::AlreadyStopped;
        };

        let _ = running.shutdown.send(true);
        if let Err(e) = running.task.await {
            tracing::error!(site = %self.name(), error = %e, "Monitor task ended abnormally");
        }

        {
            let mut status = self.status.write().await;
            status.is_running = false;
            status.next_check = None;
        }
        metrics::monitor_stopped();

        LifecycleOutcome::Stopped
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}
