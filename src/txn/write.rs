//! Read-write transactions

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::MutexGuard;

use crate::engine::Engine;
use crate::error::{GunKvError, Result};
use crate::memtable::Snapshot;
use crate::wal::{Operation, WalWriter};

use super::cursor::MergeRange;
use super::{Cursor, KvRead};

/// The engine's single writer
///
/// Holds the WAL lock for its whole lifetime, so write transactions are
/// serialized. Writes are buffered and become visible to other transactions
/// only on `commit`; dropping the transaction discards them.
pub struct WriteTxn<'e> {
    engine: &'e Engine,
    wal: MutexGuard<'e, WalWriter>,
    base: Snapshot,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'e> WriteTxn<'e> {
    pub(crate) fn new(engine: &'e Engine, wal: MutexGuard<'e, WalWriter>, base: Snapshot) -> Self {
        Self {
            engine,
            wal,
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Buffer a write, replacing any earlier write of the same key
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.pending.insert(key.into(), value.into());
    }

    /// Number of keys written so far
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Make every buffered write durable and visible, atomically
    ///
    /// Returns the LSN of the WAL entry, or `None` when nothing was written.
    /// On error nothing is applied.
    pub fn commit(self) -> Result<Option<u64>> {
        let WriteTxn {
            engine,
            mut wal,
            base,
            pending,
        } = self;

        if pending.is_empty() {
            return Ok(None);
        }

        let mut added = 0usize;
        let mut removed = 0usize;
        for (key, value) in &pending {
            match base.get(key) {
                Some(old) => removed += old.len(),
                None => added += key.len(),
            }
            added += value.len();
        }
        let required = base.size() + added - removed;
        let map_size = engine.config().map_size;
        if required > map_size {
            return Err(GunKvError::MapFull { required, map_size });
        }

        let operations: Vec<Operation> = pending
            .into_iter()
            .map(|(key, value)| Operation::Put { key, value })
            .collect();

        let lsn = wal.append(&operations)?;
        tracing::debug!(lsn, operations = operations.len(), "committed write transaction");

        // Release our snapshot so the apply can write the base in place
        drop(base);
        engine.publish(operations);
        engine.maybe_checkpoint(&mut wal);

        Ok(Some(lsn))
    }

    /// Discard every buffered write
    pub fn abort(self) {
        tracing::debug!(discarded = self.pending.len(), "aborted write transaction");
    }
}

impl KvRead for WriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match self.pending.get(key) {
            Some(value) => Some(value.as_slice()),
            None => self.base.get(key),
        }
    }

    fn cursor(&self, start: &[u8]) -> Cursor<'_> {
        let pending = self
            .pending
            .range::<[u8], _>((Bound::Included(start), Bound::Unbounded))
            .map(|(k, v)| (k.as_slice(), v.as_slice()));
        let base = self.base.range_from(start);

        Cursor::new(MergeRange::new(pending, base), self.engine.cursor_counter())
    }
}
