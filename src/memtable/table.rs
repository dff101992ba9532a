//! MemTable implementation
//!
//! BTreeMap-based ordered table. Committed tables are shared between
//! transactions behind an `Arc`, as the base or a layer of a `Snapshot`.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Ordered in-memory table holding every committed key
#[derive(Debug, Clone, Default)]
pub struct MemTable {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Total bytes of keys and values
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Put a key-value pair, returning the new table size
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let key_len = key.len();
        let value_len = value.len();
        match self.data.insert(key, value) {
            // key bytes were already counted
            Some(old) => self.size = self.size - old.len() + value_len,
            None => self.size += key_len + value_len,
        }
        self.size
    }

    /// Get size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the table, yielding entries in sorted key order
    pub fn into_entries(self) -> impl Iterator<Item = (Vec<u8>, Vec<u8>)> {
        self.data.into_iter()
    }

    /// Iterate over all entries in sorted key order
    pub fn iter(&self) -> MemTableIterator<'_> {
        MemTableIterator {
            inner: self.data.range::<[u8], _>((Bound::Unbounded, Bound::Unbounded)),
        }
    }

    /// Iterate in sorted key order starting at the first key `>= start`
    pub fn range_from(&self, start: &[u8]) -> MemTableIterator<'_> {
        MemTableIterator {
            inner: self
                .data
                .range::<[u8], _>((Bound::Included(start), Bound::Unbounded)),
        }
    }
}

impl<'a> IntoIterator for &'a MemTable {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = MemTableIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over MemTable entries
pub struct MemTableIterator<'a> {
    inner: btree_map::Range<'a, Vec<u8>, Vec<u8>>,
}

impl<'a> Iterator for MemTableIterator<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
