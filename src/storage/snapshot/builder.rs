//! Snapshot Builder
//!
//! Writes sorted key-value entries to a new snapshot file.
//!
//! Entries go to a `.tmp` sibling first; `finish` fsyncs it and renames it
//! over the target, so a crash mid-write leaves the previous snapshot intact.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{EventEaseError, Result};

use super::{Snapshot, MAGIC, VERSION};

/// Builder for creating a snapshot from sorted entries
pub struct SnapshotBuilder {
    /// Final file path
    path: PathBuf,
    /// Temporary file path entries are written to
    tmp_path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Number of entries written
    entry_count: u64,
    /// Last key written, to enforce ordering
    last_key: Option<String>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
}

impl SnapshotBuilder {
    /// Create a new snapshot builder targeting `path`
    ///
    /// Writes the header immediately; call `add()` in sorted key order,
    /// then `finish()` to write the footer and publish the file.
    pub fn new(path: &Path) -> Result<Self> {
        let tmp_path = path.with_extension("tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        let mut writer = BufWriter::new(file);

        // entry count and last LSN are patched in finish()
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            tmp_path,
            writer,
            entry_count: 0,
            last_key: None,
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add a key-value pair (must be called in strictly ascending key order)
    pub fn add(&mut self, key: &str, value: &[u8]) -> Result<()> {
        if let Some(last) = &self.last_key {
            if key <= last.as_str() {
                return Err(EventEaseError::Storage(format!(
                    "Snapshot keys out of order: {:?} after {:?}",
                    key, last
                )));
            }
        }

        let key_len_bytes = (key.len() as u32).to_le_bytes();
        let val_len_bytes = (value.len() as u32).to_le_bytes();

        self.writer.write_all(&key_len_bytes)?;
        self.writer.write_all(&val_len_bytes)?;
        self.writer.write_all(key.as_bytes())?;
        self.writer.write_all(value)?;

        self.data_hasher.update(&key_len_bytes);
        self.data_hasher.update(&val_len_bytes);
        self.data_hasher.update(key.as_bytes());
        self.data_hasher.update(value);

        self.entry_count += 1;
        self.last_key = Some(key.to_string());

        Ok(())
    }

    /// Finish building: write footer, fsync, and atomically replace the target
    pub fn finish(mut self, last_lsn: u64) -> Result<Snapshot> {
        let data_crc = self.data_hasher.finalize();

        self.writer.write_all(&data_crc.to_le_bytes())?;
        self.writer.write_all(&[0u8; 4])?;
        self.writer.flush()?;

        let mut file = self.writer.into_inner().map_err(|e| {
            EventEaseError::Storage(format!("Failed to flush snapshot: {}", e))
        })?;
        file.seek(SeekFrom::Start(6))?; // After magic + version
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.write_all(&last_lsn.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();
        drop(file);

        fs::rename(&self.tmp_path, &self.path)?;
        sync_parent_dir(&self.path)?;

        Ok(Snapshot {
            path: self.path,
            entry_count: self.entry_count,
            last_lsn,
            file_size,
        })
    }
}

/// fsync the directory holding `path` so a rename into it survives power loss
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()?;
    Ok(())
}
