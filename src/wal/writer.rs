//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;
use super::{Operation, WalEntry, WalRecovery};

/// Writes entries to the WAL file
///
/// Every append is flushed to the OS before returning, so a process restart
/// never loses an acknowledged entry; `sync_strategy` only decides how often
/// the file is fsynced.
pub struct WalWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    next_lsn: u64,
    sync_strategy: WalSyncStrategy,
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing log is appended to and LSNs continue after its last
    /// valid entry. Run `WalRecovery::recover` first if the tail may be torn.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        Self::open_at(path, sync_strategy, 1)
    }

    /// Like `open`, but never hands out an LSN below `min_next_lsn`
    pub fn open_at(path: &Path, sync_strategy: WalSyncStrategy, min_next_lsn: u64) -> Result<Self> {
        let existing_last = match path.metadata() {
            Ok(meta) if meta.len() > 0 => WalRecovery::verify(path)?.last_lsn,
            _ => 0,
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            next_lsn: (existing_last + 1).max(min_next_lsn),
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an operation to the WAL, returning its LSN
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.next_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        self.writer.write_all(&bytes)?;
        self.writer.flush()?;
        self.next_lsn += 1;
        self.unsynced += 1;

        match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.sync()?,
            WalSyncStrategy::EveryNEntries { count } => {
                if self.unsynced >= count {
                    self.sync()?;
                }
            }
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every entry (after a checkpoint made them redundant)
    ///
    /// LSNs keep counting up from where they were.
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_ref();
        file.set_len(0)?;
        file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// The LSN the next append will receive
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// The LSN of the most recent append (0 if none yet)
    pub fn last_lsn(&self) -> u64 {
        self.next_lsn - 1
    }

    /// Entries appended since the last fsync
    pub fn unsynced_entries(&self) -> usize {
        self.unsynced
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
