//! Snapshot Module
//!
//! Full, sorted image of the table written at each checkpoint.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (22 bytes)                                        │
//! │   Magic: "EVTK" (4) | Version: u16 (2) | Count: u64 (8)  │
//! │   LastLsn: u64 (8)                                       │
//! ├──────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                    │
//! │   [KeyLen: u32][ValLen: u32][Key][Value]                 │
//! │   ... repeated for each entry, ascending key order ...   │
//! ├──────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                         │
//! │   DataCRC: u32 (4) | Padding (4)                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. `LastLsn` is the last WAL entry already
//! reflected in the snapshot; replay skips anything at or below it.

mod builder;
mod reader;

use std::path::PathBuf;

pub use builder::SnapshotBuilder;
pub use reader::{LoadedSnapshot, SnapshotReader};

/// Magic bytes identifying an EventEase snapshot file
pub(crate) const MAGIC: &[u8; 4] = b"EVTK";

/// Current snapshot format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) + LastLsn (8)
pub(crate) const HEADER_SIZE: usize = 22;

/// Footer size: DataCRC (4) + Padding (4)
pub(crate) const FOOTER_SIZE: usize = 8;

/// Metadata of a snapshot written by `SnapshotBuilder::finish`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Path to the snapshot file
    pub path: PathBuf,
    /// Number of entries in the snapshot
    pub entry_count: u64,
    /// Last WAL LSN covered by the snapshot
    pub last_lsn: u64,
    /// File size in bytes
    pub file_size: u64,
}
