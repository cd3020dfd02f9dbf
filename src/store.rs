//! Store Module
//!
//! The durable ordered map that owns every ticket record.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and snapshot storage
//! - Handle concurrent read/write access
//! - Checkpoint the table once enough WAL entries accumulate
//! - Manage crash recovery on startup

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::storage::{Snapshot, SnapshotBuilder, SnapshotReader};
use crate::wal::{Operation, WalRecovery, WalWriter};

/// Ordered, restart-safe map from string keys to `V`
///
/// Values are held JSON-encoded in the memtable and decoded on the way out,
/// so callers never share state with the store.
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (insert/remove/checkpoint): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Must acquire: write_lock → WAL → memtable
///
/// - **Reads** (get/values): Concurrent
///   - No write_lock needed
///   - MemTable uses internal RwLock (many concurrent readers)
pub struct DurableMap<V> {
    /// Store configuration
    config: Config,

    /// Path of the checkpoint file
    snapshot_path: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// Every live entry, ordered by key (internal RwLock)
    memtable: MemTable,

    /// Serializes write operations (insert/remove/checkpoint)
    write_lock: Mutex<()>,

    /// WAL entries appended since the last checkpoint
    pending: AtomicUsize,

    _value: PhantomData<fn() -> V>,
}

impl<V> DurableMap<V>
where
    V: Serialize + DeserializeOwned,
{
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SNAPSHOT_FILENAME: &'static str = "snapshot.db";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load the last snapshot if one exists
    /// 3. Replay the WAL on top of it (dropping a torn tail)
    /// 4. Checkpoint if anything was replayed
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        let wal_path = config.data_dir.join(Self::WAL_FILENAME);
        let snapshot_path = config.data_dir.join(Self::SNAPSHOT_FILENAME);

        // A leftover temp file means a checkpoint died before its rename
        let stale_tmp = snapshot_path.with_extension("tmp");
        if stale_tmp.exists() {
            tracing::warn!("Removing unfinished snapshot {}", stale_tmp.display());
            fs::remove_file(&stale_tmp)?;
        }

        let memtable = MemTable::new();

        // Step 2: Load the snapshot
        let snapshot_lsn = if snapshot_path.exists() {
            let snapshot = SnapshotReader::load(&snapshot_path)?;
            tracing::info!(
                "Loaded snapshot: {} entries, last_lsn={}",
                snapshot.entries.len(),
                snapshot.last_lsn
            );
            for (key, value) in snapshot.entries {
                memtable.put(key, value);
            }
            snapshot.last_lsn
        } else {
            0
        };

        // Step 3: Replay the WAL
        let mut wal_entries = 0;
        let mut replayed = 0;
        let mut wal_last_lsn = 0;
        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }

            wal_entries = entries.len();
            wal_last_lsn = recovery.last_lsn;

            for entry in entries {
                // Already part of the snapshot
                if entry.lsn <= snapshot_lsn {
                    continue;
                }
                match entry.operation {
                    Operation::Insert { key, value } => {
                        memtable.put(key, value);
                    }
                    Operation::Remove { key } => {
                        memtable.remove(&key);
                    }
                }
                replayed += 1;
            }
        }

        let wal = WalWriter::open_at(
            &wal_path,
            config.wal_sync_strategy,
            snapshot_lsn.max(wal_last_lsn) + 1,
        )?;

        let map = Self {
            config,
            snapshot_path,
            wal: Mutex::new(wal),
            memtable,
            write_lock: Mutex::new(()),
            pending: AtomicUsize::new(wal_entries),
            _value: PhantomData,
        };

        // Step 4: Fold the recovered log into a fresh snapshot so it can be dropped
        if wal_entries > 0 {
            tracing::info!("Checkpointing after replay of {} WAL entries", replayed);
            map.checkpoint()?;
        }

        Ok(map)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Insert or overwrite the value at `key`
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability)
    /// 3. Write to MemTable
    /// 4. Checkpoint if the WAL is long enough
    pub fn insert(&self, key: &str, value: &V) -> Result<()> {
        let encoded = serde_json::to_vec(value)?;

        let _write_guard = self.write_lock.lock();

        self.wal.lock().append(Operation::Insert {
            key: key.to_string(),
            value: encoded.clone(),
        })?;

        self.memtable.put(key.to_string(), encoded);

        self.after_write()
    }

    /// Look up the value at `key`
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        self.memtable
            .get(key)
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.memtable.contains_key(key)
    }

    /// Every stored value, in ascending key order
    pub fn values(&self) -> Result<Vec<V>> {
        self.memtable
            .values()
            .iter()
            .map(|bytes| Self::decode(bytes))
            .collect()
    }

    /// Remove `key`, returning its prior value
    ///
    /// A missing key is not an error and writes nothing to the WAL.
    pub fn remove(&self, key: &str) -> Result<Option<V>> {
        let _write_guard = self.write_lock.lock();

        let prior = match self.memtable.get(key) {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        self.wal.lock().append(Operation::Remove {
            key: key.to_string(),
        })?;

        self.memtable.remove(key);

        self.after_write()?;

        Self::decode(&prior).map(Some)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// Write the whole table to a snapshot and truncate the WAL
    pub fn checkpoint(&self) -> Result<Snapshot> {
        let _write_guard = self.write_lock.lock();
        self.checkpoint_internal()
    }

    /// Force the WAL to disk
    pub fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }

    /// Close the store gracefully
    ///
    /// Checkpoints any pending WAL entries and syncs to disk
    pub fn close(self) -> Result<()> {
        if self.pending.load(Ordering::SeqCst) > 0 {
            self.checkpoint()?;
        }
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the snapshot file path
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// WAL entries written since the last checkpoint
    pub fn pending_wal_entries(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Called with the write lock held after every logged mutation
    ///
    /// The mutation is already in the WAL, so a failed checkpoint is only
    /// logged; `pending` stays over the threshold and the next write retries.
    fn after_write(&self) -> Result<()> {
        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        if pending >= self.config.checkpoint_threshold {
            if let Err(e) = self.checkpoint_internal() {
                tracing::warn!(
                    "Checkpoint failed with {} WAL entries pending, will retry: {}",
                    pending,
                    e
                );
            }
        }
        Ok(())
    }

    /// Checkpoint implementation (called with write lock held)
    fn checkpoint_internal(&self) -> Result<Snapshot> {
        let mut wal = self.wal.lock();
        wal.sync()?;

        let mut builder = SnapshotBuilder::new(&self.snapshot_path)?;
        for (key, value) in self.memtable.iter() {
            builder.add(&key, &value)?;
        }
        let snapshot = builder.finish(wal.last_lsn())?;

        // Entries are now durable in the snapshot
        wal.truncate()?;
        self.pending.store(0, Ordering::SeqCst);

        tracing::info!(
            "Checkpoint written: {} entries, last_lsn={}, {} bytes",
            snapshot.entry_count,
            snapshot.last_lsn,
            snapshot.file_size
        );

        Ok(snapshot)
    }

    fn decode(bytes: &[u8]) -> Result<V> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
