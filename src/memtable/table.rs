//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

/// In-memory ordered table of encoded values
pub struct MemTable {
    inner: RwLock<Inner>,
}

struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    /// Approximate size in bytes (keys + values)
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                data: BTreeMap::new(),
                size: 0,
            }),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.read().data.get(key).cloned()
    }

    /// Check whether a key is present (read lock)
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().data.contains_key(key)
    }

    /// Insert or overwrite a value (write lock)
    ///
    /// Returns the new approximate size.
    pub fn put(&self, key: String, value: Vec<u8>) -> usize {
        let mut inner = self.inner.write();
        let key_len = key.len();
        let value_len = value.len();

        match inner.data.insert(key, value) {
            // key bytes are already counted
            Some(old) => inner.size = inner.size - old.len() + value_len,
            None => inner.size += key_len + value_len,
        }

        inner.size
    }

    /// Remove a key, returning its value if it was present (write lock)
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        let mut inner = self.inner.write();
        let removed = inner.data.remove(key);
        if let Some(value) = &removed {
            inner.size -= key.len() + value.len();
        }
        removed
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.inner.read().data.len()
    }

    /// Check if the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// All values in ascending key order
    pub fn values(&self) -> Vec<Vec<u8>> {
        self.inner.read().data.values().cloned().collect()
    }

    /// Iterate over a point-in-time copy of all entries, in sorted key order
    pub fn iter(&self) -> MemTableIterator {
        let entries: Vec<(String, Vec<u8>)> = self
            .inner
            .read()
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        MemTableIterator {
            inner: entries.into_iter(),
        }
    }

    /// Clear all entries
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.data.clear();
        inner.size = 0;
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over MemTable entries
pub struct MemTableIterator {
    inner: std::vec::IntoIter<(String, Vec<u8>)>,
}

impl Iterator for MemTableIterator {
    type Item = (String, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for MemTableIterator {}
