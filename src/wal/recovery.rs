//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;
use super::reader::ReadOutcome;
use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries found (scanning stops at the first)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether bytes after the last valid entry were (or would be) dropped
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Stop at the first torn or corrupted entry
    /// 3. Truncate the file after the last valid entry
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut entries = Vec::new();
        let (result, valid_len) = Self::scan(path, |entry| entries.push(entry))?;

        if result.was_truncated {
            tracing::warn!(
                "WAL {} has a damaged tail; truncating to {} bytes ({} corrupted)",
                path.display(),
                valid_len,
                result.entries_corrupted
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (result, _) = Self::scan(path, |_| {})?;
        Ok(result)
    }

    /// Walk the log, handing each valid entry to `visit`
    ///
    /// Returns the stats and the byte length of the valid prefix.
    fn scan<F: FnMut(WalEntry)>(path: &Path, mut visit: F) -> Result<(RecoveryResult, u64)> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();

        loop {
            match reader.read_next()? {
                ReadOutcome::Entry(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    visit(entry);
                }
                ReadOutcome::End => break,
                ReadOutcome::TornTail => {
                    result.was_truncated = true;
                    break;
                }
                ReadOutcome::Corrupt(reason) => {
                    tracing::debug!("WAL scan stopped: {}", reason);
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
            }
        }

        Ok((result, reader.position()))
    }
}
