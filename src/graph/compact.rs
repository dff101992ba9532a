//! Compact Node Store
//!
//! A compact node is a single JSON record at its primary key. It is read and
//! rewritten whole, and promoted to the wide form once its field count
//! reaches the configured threshold.

use crate::error::{GunKvError, Result};
use crate::txn::{KvRead, WriteTxn};

use super::crdt::CrdtResolver;
use super::keys;
use super::node::{FieldRange, GetOptions, GunGraph, GunNode};
use super::wide::WideStore;
use super::{single, NodeStore};

pub(crate) struct CompactStore<'a, R> {
    resolver: &'a R,
    wide: WideStore<'a, R>,
    threshold: usize,
}

impl<'a, R: CrdtResolver> CompactStore<'a, R> {
    pub fn new(resolver: &'a R, wide: WideStore<'a, R>, threshold: usize) -> Self {
        Self {
            resolver,
            wide,
            threshold,
        }
    }

    fn read_existing<T: KvRead>(txn: &T, soul: &str) -> Result<Option<GunNode>> {
        let key = keys::primary_key(soul);
        match txn.get(key) {
            Some(bytes) => decode_node(key, bytes).map(Some),
            None => Ok(None),
        }
    }
}

impl<R: CrdtResolver> NodeStore for CompactStore<'_, R> {
    fn get<T: KvRead>(&self, txn: &T, soul: &str, opts: &GetOptions) -> Result<Option<GunNode>> {
        let Some(node) = Self::read_existing(txn, soul)? else {
            return Ok(None);
        };

        let range = opts.field_range();
        if range.is_unbounded() {
            return Ok(Some(node));
        }

        let filtered = filter_fields(node, &range);
        Ok(if filtered.is_empty() { None } else { Some(filtered) })
    }

    fn put(&self, txn: &mut WriteTxn<'_>, soul: &str, updates: &GunNode) -> Result<Option<GunNode>> {
        let existing = match Self::read_existing(&*txn, soul)? {
            Some(node) => single(soul, node),
            None => GunGraph::new(),
        };

        let diff = self.resolver.diff(&single(soul, updates.clone()), &existing)?;
        let Some(changes) = diff
            .and_then(|mut diff| diff.remove(soul))
            .map(GunNode::without_meta_field)
            .filter(|changes| !changes.is_empty())
        else {
            return Ok(None);
        };

        let merged = self
            .resolver
            .merge(&existing, &single(soul, changes.clone()))?
            .remove(soul)
            .map(GunNode::without_meta_field)
            .ok_or_else(|| GunKvError::Resolver(format!("merge result lacks node {:?}", soul)))?;

        if merged.field_count() >= self.threshold {
            tracing::info!(
                soul,
                fields = merged.field_count(),
                threshold = self.threshold,
                "promoting node to wide representation"
            );
            txn.put(keys::primary_key(soul), keys::WIDE_NODE_MARKER);
            self.wide.promote(txn, soul, &merged)?;
        } else {
            let bytes =
                serde_json::to_vec(&merged).map_err(|e| GunKvError::Serialization(e.to_string()))?;
            txn.put(keys::primary_key(soul), bytes);
        }

        Ok(Some(changes))
    }
}

pub(crate) fn decode_node(key: &[u8], bytes: &[u8]) -> Result<GunNode> {
    serde_json::from_slice(bytes).map_err(|e| GunKvError::decode(key, e))
}

/// Keep the fields inside `range`, walking names in sorted order
fn filter_fields(node: GunNode, range: &FieldRange<'_>) -> GunNode {
    let mut filtered = GunNode::new(node.meta.soul.clone());
    for (field, value) in node.fields {
        if range.is_past(&field) {
            break;
        }
        if !range.contains(&field) {
            continue;
        }
        match node.meta.state.get(&field) {
            Some(&state) => filtered.set(field, value, state),
            None => {
                filtered.fields.insert(field, value);
            }
        }
    }
    filtered
}
