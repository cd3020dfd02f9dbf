//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{EventEaseError, Result};
use super::entry::EntryHeader;
use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// What the reader found at its current position
pub(super) enum ReadOutcome {
    /// A complete, checksummed entry
    Entry(WalEntry),

    /// Clean end of file
    End,

    /// The file ends in the middle of an entry (interrupted write)
    TornTail,

    /// A complete entry whose checksum or body is invalid
    Corrupt(String),
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset just past the last complete entry
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file and `WalCorruption` for a
    /// torn or damaged entry.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.read_next()? {
            ReadOutcome::Entry(entry) => Ok(Some(entry)),
            ReadOutcome::End => Ok(None),
            ReadOutcome::TornTail => Err(EventEaseError::WalCorruption(format!(
                "Partial entry at offset {}",
                self.position
            ))),
            ReadOutcome::Corrupt(reason) => Err(EventEaseError::WalCorruption(reason)),
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Offset just past the last complete entry read
    pub fn position(&self) -> u64 {
        self.position
    }

    pub(super) fn read_next(&mut self) -> Result<ReadOutcome> {
        let mut raw = [0u8; HEADER_SIZE];
        let got = read_up_to(&mut self.reader, &mut raw)?;
        if got == 0 {
            return Ok(ReadOutcome::End);
        }
        if got < HEADER_SIZE {
            return Ok(ReadOutcome::TornTail);
        }

        let header = EntryHeader::parse(&raw);
        if header.len > MAX_ENTRY_SIZE {
            return Ok(ReadOutcome::Corrupt(format!(
                "Entry length {} exceeds maximum {} at offset {}",
                header.len, MAX_ENTRY_SIZE, self.position
            )));
        }

        let mut data = vec![0u8; header.len as usize];
        let got = read_up_to(&mut self.reader, &mut data)?;
        if got < data.len() {
            return Ok(ReadOutcome::TornTail);
        }

        match WalEntry::from_parts(header, &data) {
            Ok(entry) => {
                self.position += (HEADER_SIZE + data.len()) as u64;
                Ok(ReadOutcome::Entry(entry))
            }
            Err(EventEaseError::WalCorruption(reason)) => Ok(ReadOutcome::Corrupt(reason)),
            Err(e) => Err(e),
        }
    }
}

/// Fill `buf` as far as the file allows, returning the number of bytes read
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Iterator over WAL entries
///
/// Yields entries until the end of the log; a damaged entry is yielded
/// once as an error and ends the iteration.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
