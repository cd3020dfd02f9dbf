//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use serde::{Deserialize, Serialize};

use crate::error::{EventEaseError, Result};

/// Entry header: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest data section accepted when reading an entry
pub const MAX_ENTRY_SIZE: u32 = 64 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert or overwrite the value stored under `key`
    Insert { key: String, value: Vec<u8> },

    /// Remove `key`
    Remove { key: String },
}

impl Operation {
    /// The key this operation touches
    pub fn key(&self) -> &str {
        match self {
            Operation::Insert { key, .. } => key,
            Operation::Remove { key } => key,
        }
    }
}

/// On-disk body of an entry (everything except the LSN, which lives in the header)
#[derive(Serialize)]
struct BodyRef<'a> {
    operation: &'a Operation,
    timestamp: u64,
}

#[derive(Deserialize)]
struct Body {
    operation: Operation,
    timestamp: u64,
}

/// Parsed entry header
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntryHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl EntryHeader {
    pub(crate) fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Self {
            lsn: u64::from_le_bytes(lsn),
            crc: u32::from_le_bytes(crc),
            len: u32::from_le_bytes(len),
        }
    }
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode as `header + data`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(&BodyRef {
            operation: &self.operation,
            timestamp: self.timestamp,
        })?;

        if data.len() > MAX_ENTRY_SIZE as usize {
            return Err(EventEaseError::Serialization(format!(
                "WAL entry too large: {} bytes (max {})",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let crc = crc32fast::hash(&data);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&data);

        Ok(bytes)
    }

    /// Decode a single entry from the front of `bytes`
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(EventEaseError::WalCorruption(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&bytes[..HEADER_SIZE]);
        let header = EntryHeader::parse(&raw);

        let end = HEADER_SIZE + header.len as usize;
        if bytes.len() < end {
            return Err(EventEaseError::WalCorruption(format!(
                "Incomplete data: expected {} bytes, got {}",
                header.len,
                bytes.len() - HEADER_SIZE
            )));
        }

        Self::from_parts(header, &bytes[HEADER_SIZE..end])
    }

    /// Verify the checksum of `data` against `header` and decode it
    pub(crate) fn from_parts(header: EntryHeader, data: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(data);
        if actual != header.crc {
            return Err(EventEaseError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                header.lsn, header.crc, actual
            )));
        }

        let body: Body = bincode::deserialize(data).map_err(|e| {
            EventEaseError::WalCorruption(format!("Undecodable entry at LSN {}: {}", header.lsn, e))
        })?;

        Ok(Self {
            lsn: header.lsn,
            operation: body.operation,
            timestamp: body.timestamp,
        })
    }
}
