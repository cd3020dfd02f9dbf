//! Snapshot Reader
//!
//! Loads and validates a snapshot file in one pass.

use std::fs;
use std::path::Path;

use bytes::Buf;

use crate::error::{EventEaseError, Result};

use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Contents of a snapshot file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSnapshot {
    /// Last WAL LSN covered by the snapshot
    pub last_lsn: u64,
    /// Entries in ascending key order
    pub entries: Vec<(String, Vec<u8>)>,
}

/// Reader for snapshot files
pub struct SnapshotReader;

impl SnapshotReader {
    /// Read a snapshot, verifying magic, version, entry count, and data CRC
    pub fn load(path: &Path) -> Result<LoadedSnapshot> {
        let bytes = fs::read(path)?;

        if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(EventEaseError::Storage(format!(
                "Snapshot too short: {} bytes",
                bytes.len()
            )));
        }

        let mut header = &bytes[..HEADER_SIZE];
        if &header[0..4] != MAGIC {
            return Err(EventEaseError::Storage(format!(
                "Invalid snapshot magic: expected EVTK, got {:?}",
                &header[0..4]
            )));
        }
        header.advance(4);

        let version = header.get_u16_le();
        if version != VERSION {
            return Err(EventEaseError::Storage(format!(
                "Unsupported snapshot version: {}",
                version
            )));
        }

        let entry_count = header.get_u64_le();
        let last_lsn = header.get_u64_le();

        let data_end = bytes.len() - FOOTER_SIZE;
        let data = &bytes[HEADER_SIZE..data_end];
        let mut footer = &bytes[data_end..];
        let expected_crc = footer.get_u32_le();

        let actual_crc = crc32fast::hash(data);
        if actual_crc != expected_crc {
            return Err(EventEaseError::Storage(format!(
                "Snapshot CRC mismatch: expected {:08x}, got {:08x}",
                expected_crc, actual_crc
            )));
        }

        let entries = Self::parse_entries(data, entry_count)?;

        Ok(LoadedSnapshot { last_lsn, entries })
    }

    /// Parse `[key_len][val_len][key][value]` records
    fn parse_entries(mut data: &[u8], entry_count: u64) -> Result<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::with_capacity(entry_count.min(1 << 20) as usize);

        while data.has_remaining() {
            if data.remaining() < 8 {
                return Err(EventEaseError::Storage(
                    "Snapshot entry header truncated".to_string(),
                ));
            }
            let key_len = data.get_u32_le() as usize;
            let val_len = data.get_u32_le() as usize;

            if data.remaining() < key_len + val_len {
                return Err(EventEaseError::Storage(
                    "Snapshot entry body truncated".to_string(),
                ));
            }

            let key = String::from_utf8(data[..key_len].to_vec()).map_err(|e| {
                EventEaseError::Storage(format!("Snapshot key is not UTF-8: {}", e))
            })?;
            data.advance(key_len);

            let value = data[..val_len].to_vec();
            data.advance(val_len);

            entries.push((key, value));
        }

        if entries.len() as u64 != entry_count {
            return Err(EventEaseError::Storage(format!(
                "Snapshot entry count mismatch: header says {}, found {}",
                entry_count,
                entries.len()
            )));
        }

        Ok(entries)
    }
}
