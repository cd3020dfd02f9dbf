//! Storage Module
//!
//! Persistent checkpoint layer for the durable map.
//!
//! ## Responsibilities
//! - Persist the whole table to disk in sorted format
//! - Validate checkpoints on load (magic, version, CRC32)
//! - Publish new checkpoints atomically (write temp file, fsync, rename)

mod snapshot;

pub use snapshot::{LoadedSnapshot, Snapshot, SnapshotBuilder, SnapshotReader};
