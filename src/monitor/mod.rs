//! Monitor engine
//!
//! - [`diff`] - new-item detection by identity key
//! - [`worker`] - fetch, extract, diff, persist and notify for one site
//! - [`handle`] - start/stop control of a worker task
//! - [`registry`] - name-keyed directory of handles
//! - [`manager`] - lifecycle operations used by the control plane

pub mod diff;
pub mod handle;
pub mod manager;
pub mod registry;
pub mod worker;

pub use diff::diff;
pub use handle::{LifecycleOutcome, MonitorHandle};
pub use manager::MonitorManager;
pub use registry::StatusRegistry;
pub use worker::{CheckReport, MonitorWorker};
