//! Snapshot storage
//!
//! Each monitored site keeps exactly one snapshot, replaced after every
//! successful check.

pub mod snapshot;

pub use snapshot::{
    decode_snapshot, encode_snapshot, FileSnapshotStore, MemorySnapshotStore, SnapshotStore,
};
