//! Layered snapshots
//!
//! The committed key space is a base table plus a short stack of immutable
//! delta tables, newest last. A commit that finds the base shared with a
//! reader pushes its writes as a new layer instead of copying the base.
//! Layers are merged size-tiered: a layer at least half the size of the one
//! below it is folded into it, so a stack holds O(log n) layers and every
//! byte is copied O(log n) times. The oldest layer is folded into the base
//! once it reaches half the base's size, which bounds the cost of copying a
//! shared base by the writes that triggered it.

use std::iter::Peekable;
use std::sync::Arc;

use crate::wal::Operation;

use super::{MemTable, MemTableIterator};

/// An immutable view of the committed key space
///
/// Cloning is cheap: it clones the `Arc`s of the base and of each layer.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    base: Arc<MemTable>,
    /// Delta tables, oldest first
    layers: Vec<Arc<MemTable>>,
    /// Live key and value bytes, counting each key once
    size: usize,
    /// Live keys
    entry_count: usize,
}

impl Snapshot {
    /// A snapshot holding exactly `table`
    pub fn new(table: MemTable) -> Self {
        Self {
            size: table.size(),
            entry_count: table.entry_count(),
            base: Arc::new(table),
            layers: Vec::new(),
        }
    }

    /// Get a value by key, newest layer first
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(key))
            .or_else(|| self.base.get(key))
    }

    /// Live key and value bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Live keys
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Number of delta layers over the base
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Iterate over all entries in sorted key order
    pub fn iter(&self) -> SnapshotIterator<'_> {
        self.merge(|table| table.iter())
    }

    /// Iterate in sorted key order starting at the first key `>= start`
    pub fn range_from(&self, start: &[u8]) -> SnapshotIterator<'_> {
        self.merge(|table| table.range_from(start))
    }

    fn merge<'a>(&'a self, open: impl Fn(&'a MemTable) -> MemTableIterator<'a>) -> SnapshotIterator<'a> {
        let sources = self
            .layers
            .iter()
            .rev()
            .map(|layer| open(layer.as_ref()))
            .chain(std::iter::once(open(self.base.as_ref())))
            .map(Iterator::peekable)
            .collect();
        SnapshotIterator { sources }
    }

    /// Apply committed operations
    ///
    /// Writes go straight into the base while no reader shares it. Otherwise
    /// they become a new layer and the stack is rebalanced.
    pub fn apply(&mut self, operations: Vec<Operation>) {
        let mut delta = MemTable::new();
        for operation in operations {
            match operation {
                Operation::Put { key, value } => {
                    match self.get(&key).map(<[u8]>::len) {
                        Some(old_len) => self.size = self.size - old_len + value.len(),
                        None => {
                            self.size += key.len() + value.len();
                            self.entry_count += 1;
                        }
                    }
                    delta.put(key, value);
                }
            }
        }

        if delta.is_empty() {
            return;
        }

        if let Some(base) = Arc::get_mut(&mut self.base) {
            for layer in self.layers.drain(..) {
                fold_into(base, layer);
            }
            fold_into(base, Arc::new(delta));
            return;
        }

        self.layers.push(Arc::new(delta));
        self.rebalance();
    }

    fn rebalance(&mut self) {
        while self.layers.len() >= 2 {
            let newer = self.layers[self.layers.len() - 1].size();
            let older = self.layers[self.layers.len() - 2].size();
            if newer * 2 < older {
                break;
            }
            let (Some(newer), Some(older)) = (self.layers.pop(), self.layers.pop()) else {
                break;
            };
            let mut merged = unwrap_table(older);
            fold_into(&mut merged, newer);
            self.layers.push(Arc::new(merged));
        }

        if self.layers.first().map_or(false, |oldest| oldest.size() * 2 >= self.base.size()) {
            let oldest = self.layers.remove(0);
            fold_into(Arc::make_mut(&mut self.base), oldest);
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = SnapshotIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Write every entry of `layer` over `table`
fn fold_into(table: &mut MemTable, layer: Arc<MemTable>) {
    match Arc::try_unwrap(layer) {
        Ok(layer) => {
            for (key, value) in layer.into_entries() {
                table.put(key, value);
            }
        }
        Err(layer) => {
            for (key, value) in layer.iter() {
                table.put(key.to_vec(), value.to_vec());
            }
        }
    }
}

fn unwrap_table(table: Arc<MemTable>) -> MemTable {
    Arc::try_unwrap(table).unwrap_or_else(|shared| (*shared).clone())
}

/// Sorted iterator over a snapshot's layers
///
/// Sources are ordered newest first; on equal keys the newest wins and the
/// older entries are skipped.
pub struct SnapshotIterator<'a> {
    sources: Vec<Peekable<MemTableIterator<'a>>>,
}

impl<'a> Iterator for SnapshotIterator<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let mut newest: Option<(usize, &'a [u8])> = None;
        for (index, source) in self.sources.iter_mut().enumerate() {
            if let Some(&(key, _)) = source.peek() {
                // strict: an equal key in an older source loses
                if newest.map_or(true, |(_, min)| key < min) {
                    newest = Some((index, key));
                }
            }
        }

        let (index, key) = newest?;
        for source in self.sources.iter_mut().skip(index + 1) {
            if source.peek().map_or(false, |&(k, _)| k == key) {
                source.next();
            }
        }
        self.sources[index].next()
    }
}
