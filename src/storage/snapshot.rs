//! Snapshot persistence
//!
//! A snapshot is the JSON array of items seen at a site's last successful
//! check. Stores move opaque bytes; [`encode_snapshot`] and
//! [`decode_snapshot`] convert between bytes and items.
//!
//! # Example
//!
//! ```no_run
//! use sitewatch::storage::{decode_snapshot, FileSnapshotStore, SnapshotStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = FileSnapshotStore::new("data/forum.json");
//! let previous = match store.load().await? {
//!     Some(bytes) => decode_snapshot(&bytes, store.location())?,
//!     None => Vec::new(),
//! };
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::Mutex;

use crate::models::{ExtractedItem, Snapshot};
use crate::utils::error::PersistenceError;

/// Persists the latest snapshot of one site
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored bytes; `None` when nothing has been stored yet
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Replace the stored bytes
    async fn save(&self, bytes: &[u8]) -> Result<(), PersistenceError>;

    /// Human-readable location used in logs and errors
    fn location(&self) -> &str;
}

/// Serialize items for storage
pub fn encode_snapshot(items: &[ExtractedItem]) -> Result<Vec<u8>, PersistenceError> {
    Ok(serde_json::to_vec_pretty(items)?)
}

/// Deserialize stored bytes; blank input is an empty snapshot
pub fn decode_snapshot(bytes: &[u8], location: &str) -> Result<Snapshot, PersistenceError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(bytes).map_err(|e| PersistenceError::Corrupt {
        location: location.to_string(),
        reason: e.to_string(),
    })
}

/// JSON file on local disk, written atomically
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
    location: String,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let location = path.display().to_string();
        Self { path, location }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Write {
            location: self.location.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                tracing::trace!(path = %self.location, bytes = bytes.len(), "Snapshot loaded");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Read {
                location: self.location.clone(),
                source,
            }),
        }
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        // Write to temp file first, then rename
        let temp_path = self.temp_path();
        fs::write(&temp_path, bytes)
            .await
            .map_err(|e| self.write_error(e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.write_error(e))?;

        tracing::debug!(path = %self.location, bytes = bytes.len(), "Snapshot saved");
        Ok(())
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// In-process store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    data: Mutex<Option<Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with bytes
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Mutex::new(Some(bytes.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail with a write error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current stored bytes
    pub async fn bytes(&self) -> Option<Vec<u8>> {
        self.data.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.data.lock().await.clone())
    }

    async fn save(&self, bytes: &[u8]) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Write {
                location: self.location().to_string(),
                source: std::io::Error::new(ErrorKind::Other, "writes disabled"),
            });
        }
        *self.data.lock().await = Some(bytes.to_vec());
        Ok(())
    }

    fn location(&self) -> &str {
        "memory"
    }
}
