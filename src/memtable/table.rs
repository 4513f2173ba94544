//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

/// In-memory table of live key-value pairs
pub struct MemTable {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Approximate size in bytes (keys + values)
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().data.get(key).cloned()
    }

    /// Put a key-value pair (write lock)
    ///
    /// Returns the approximate size after the write.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut inner = self.inner.write();
        let key_len = key.len();
        inner.size += key_len + value.len();
        if let Some(old) = inner.data.insert(key, value) {
            inner.size -= key_len + old.len();
        }
        inner.size
    }

    /// Remove a key (write lock)
    ///
    /// Returns the approximate size after the removal.
    pub fn remove(&self, key: &[u8]) -> usize {
        let mut inner = self.inner.write();
        if let Some(old) = inner.data.remove(key) {
            inner.size -= key.len() + old.len();
        }
        inner.size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    /// Check if the table holds no keys
    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// Snapshot of all entries in sorted key order
    ///
    /// Copies under a read lock so callers never hold the lock while doing I/O.
    pub fn iter(&self) -> std::vec::IntoIter<(Vec<u8>, Vec<u8>)> {
        let inner = self.inner.read();
        inner
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Remove every entry
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
