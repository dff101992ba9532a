//! Read-only transactions

use std::sync::atomic::AtomicUsize;
use crate::memtable::Snapshot;

use super::{Cursor, KvRead};

/// A read-only view of the committed key space
///
/// Holds the snapshot that was current when it began; commits made while it
/// is open stay invisible to it.
pub struct ReadTxn<'e> {
    snapshot: Snapshot,
    open_cursors: &'e AtomicUsize,
}

impl<'e> ReadTxn<'e> {
    pub(crate) fn new(snapshot: Snapshot, open_cursors: &'e AtomicUsize) -> Self {
        Self {
            snapshot,
            open_cursors,
        }
    }

    /// Number of keys visible to this transaction
    pub fn entry_count(&self) -> usize {
        self.snapshot.entry_count()
    }
}

impl KvRead for ReadTxn<'_> {
    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.snapshot.get(key)
    }

    fn cursor(&self, start: &[u8]) -> Cursor<'_> {
        Cursor::new(self.snapshot.range_from(start), self.open_cursors)
    }
}
