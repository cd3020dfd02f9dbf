//! MemTable Module
//!
//! In-memory ordered table holding every live record.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track approximate size for diagnostics
//! - Ordered iteration for snapshots and enumeration
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys (ascending enumeration, sorted snapshot files)
//! - O(log n) point operations regardless of table size

mod table;

pub use table::{MemTable, MemTableIterator};
