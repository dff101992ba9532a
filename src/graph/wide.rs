//! Wide Node Store
//!
//! A wide node keeps one record per field under `wide:<soul>/<field>`, so a
//! read touches only the fields it asks for and a write only the fields that
//! changed.

use serde::{Deserialize, Serialize};

use crate::error::{GunKvError, Result};
use crate::txn::{KvRead, WriteTxn};

use super::crdt::CrdtResolver;
use super::keys;
use super::node::{GetOptions, GunNode, GunValue, State};
use super::{single, NodeStore};

/// Stored form of one wide field
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct WideRecord {
    #[serde(rename = "stateVector")]
    pub state_vector: State,

    #[serde(default)]
    pub value: GunValue,
}

#[derive(Serialize)]
struct WideRecordRef<'a> {
    #[serde(rename = "stateVector")]
    state_vector: State,
    value: &'a GunValue,
}

impl WideRecord {
    fn decode(key: &[u8], bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| GunKvError::decode(key, e))
    }

    fn encode(state_vector: State, value: &GunValue) -> Result<Vec<u8>> {
        serde_json::to_vec(&WideRecordRef {
            state_vector,
            value,
        })
        .map_err(|e| GunKvError::Serialization(e.to_string()))
    }
}

pub(crate) struct WideStore<'a, R> {
    resolver: &'a R,
    max_keys: usize,
}

impl<'a, R: CrdtResolver> WideStore<'a, R> {
    pub fn new(resolver: &'a R, max_keys: usize) -> Self {
        Self { resolver, max_keys }
    }

    /// Write every field of `node` as a wide record
    pub fn promote(&self, txn: &mut WriteTxn<'_>, soul: &str, node: &GunNode) -> Result<()> {
        for (field, value) in &node.fields {
            let state = node.state_of(field).ok_or_else(|| missing_state(soul, field))?;
            txn.put(keys::wide_field_key(soul, field), WideRecord::encode(state, value)?);
        }
        Ok(())
    }
}

impl<R: CrdtResolver> NodeStore for WideStore<'_, R> {
    /// Range scan over the node's field keys
    ///
    /// The cursor is positioned at the lower bound (inclusive) or at the
    /// node's prefix, and the scan stops at the first key outside the node,
    /// past the upper bound, or once `max_keys` fields were collected.
    ///
    /// Souls are not escaped in keys, so the prefix `wide:a/` of soul `a`
    /// also covers the field keys of a wide soul `a/b`. Those come back as
    /// fields `b/<field>` of `a`; callers nesting souls under a wide soul
    /// should narrow the read with `opts`.
    fn get<T: KvRead>(&self, txn: &T, soul: &str, opts: &GetOptions) -> Result<Option<GunNode>> {
        let range = opts.field_range();
        let prefix = keys::wide_prefix(soul);
        let start = match range.lower {
            Some(lower) => keys::wide_field_key(soul, lower),
            None => prefix.clone(),
        };

        let mut node = GunNode::new(soul);
        for (key, bytes) in txn.cursor(&start) {
            let Some(field) = keys::wide_field_name(&prefix, key) else {
                break;
            };
            let field = std::str::from_utf8(field).map_err(|_| {
                GunKvError::Storage(format!(
                    "wide field key {:?} is not UTF-8",
                    String::from_utf8_lossy(key)
                ))
            })?;
            if range.is_past(field) {
                break;
            }

            let record = WideRecord::decode(key, bytes)?;
            node.set(field, record.value, record.state_vector);

            if node.field_count() >= self.max_keys || range.upper == Some(field) {
                break;
            }
        }

        Ok(if node.is_empty() { None } else { Some(node) })
    }

    /// Field-wise update
    ///
    /// Only the records of fields named in `updates` are read; the resolver
    /// sees a sparse node holding just those.
    fn put(&self, txn: &mut WriteTxn<'_>, soul: &str, updates: &GunNode) -> Result<Option<GunNode>> {
        let mut sparse = GunNode::new(soul);
        for field in updates.fields.keys() {
            let key = keys::wide_field_key(soul, field);
            if let Some(bytes) = txn.get(&key) {
                let record = WideRecord::decode(&key, bytes)?;
                sparse.set(field.clone(), record.value, record.state_vector);
            }
        }

        let diff = self
            .resolver
            .diff(&single(soul, updates.clone()), &single(soul, sparse))?;
        let Some(changes) = diff
            .and_then(|mut diff| diff.remove(soul))
            .map(GunNode::without_meta_field)
            .filter(|changes| !changes.is_empty())
        else {
            return Ok(None);
        };

        for (field, value) in &changes.fields {
            let state = changes.state_of(field).ok_or_else(|| missing_state(soul, field))?;
            txn.put(keys::wide_field_key(soul, field), WideRecord::encode(state, value)?);
        }

        Ok(Some(changes))
    }
}

fn missing_state(soul: &str, field: &str) -> GunKvError {
    GunKvError::Resolver(format!("field {:?} of {:?} has no state", field, soul))
}
