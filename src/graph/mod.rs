//! Graph Module
//!
//! Stores GUN graph nodes in the engine.
//!
//! ## Representations
//! A node is stored in exactly one of two forms, chosen by its primary record:
//! - **Compact**: the whole node as one JSON record
//! - **Wide**: the `WIDE_NODE` marker, plus one record per field
//!
//! Compact nodes become wide once their field count reaches
//! `Config::wide_node_threshold`; wide nodes never go back.
//!
//! ## Conflict resolution
//! Stores never compare states themselves. Every write goes through a
//! `CrdtResolver` (`HamResolver` by default) and the stores persist exactly
//! what its diff and merge return.

mod adapter;
mod compact;
mod crdt;
pub mod keys;
mod node;
mod wide;

pub use adapter::GraphAdapter;
pub use crdt::{CrdtResolver, FnResolver, HamResolver, DEFAULT_FUTURE_GRACE_MS};
pub use node::{GetOptions, GunGraph, GunNode, GunValue, NodeMeta, SoulRef, State, META_FIELD};

use crate::error::Result;
use crate::txn::{KvRead, WriteTxn};

/// How a soul is currently stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Absent,
    Compact,
    Wide,
}

impl Representation {
    /// Classify a node by its primary record
    pub fn of(primary: Option<&[u8]>) -> Self {
        match primary {
            None => Representation::Absent,
            Some(keys::WIDE_NODE_MARKER) => Representation::Wide,
            Some(_) => Representation::Compact,
        }
    }
}

/// Read and write access to one node representation
pub(crate) trait NodeStore {
    /// Read `soul`, narrowed to the fields `opts` selects
    fn get<T: KvRead>(&self, txn: &T, soul: &str, opts: &GetOptions) -> Result<Option<GunNode>>;

    /// Resolve `updates` against the stored node and write the outcome
    ///
    /// Returns the diff, or `None` when nothing changed.
    fn put(&self, txn: &mut WriteTxn<'_>, soul: &str, updates: &GunNode) -> Result<Option<GunNode>>;
}

/// A graph holding only `node`, filed under `soul`
pub(crate) fn single(soul: &str, node: GunNode) -> GunGraph {
    let mut node = node.without_meta_field();
    node.meta.soul = soul.to_string();
    GunGraph::from([(soul.to_string(), node)])
}
