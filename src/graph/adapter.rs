//! Graph Adapter
//!
//! The storage surface GUN talks to: `get`/`put` over souls, one engine
//! transaction per call.

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{GunKvError, Result};
use crate::txn::KvRead;

use super::compact::CompactStore;
use super::crdt::{CrdtResolver, HamResolver};
use super::keys;
use super::node::{GetOptions, GunGraph, GunNode};
use super::wide::WideStore;
use super::{NodeStore, Representation};

/// GUN graph storage over an embedded engine
///
/// Reads run in snapshot transactions and never wait for writers. Each `put`
/// is one write transaction covering every soul in the graph: either all of
/// its changes commit or none do.
///
/// # Example
/// ```no_run
/// use gunkv::{Config, GetOptions, GraphAdapter, GunGraph, GunNode};
///
/// let adapter = GraphAdapter::open(Config::builder().data_dir("/tmp/gun").build())?;
///
/// let mut graph = GunGraph::new();
/// graph.insert("~alice".into(), GunNode::new("~alice").with("name", "Alice", 1.0));
/// adapter.put_sync(&graph)?;
///
/// let node = adapter.get_sync("~alice", &GetOptions::all())?;
/// assert!(node.is_some());
/// # Ok::<(), gunkv::GunKvError>(())
/// ```
pub struct GraphAdapter<R = HamResolver> {
    engine: Engine,
    resolver: R,
}

impl GraphAdapter<HamResolver> {
    /// Open with GUN's default conflict resolution
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_resolver(config, HamResolver::default())
    }
}

impl<R: CrdtResolver> GraphAdapter<R> {
    pub fn open_with_resolver(config: Config, resolver: R) -> Result<Self> {
        Ok(Self::from_engine(Engine::open(config)?, resolver))
    }

    /// Wrap an engine that is already open
    pub fn from_engine(engine: Engine, resolver: R) -> Self {
        Self { engine, resolver }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read a node, narrowed to the fields `opts` selects
    ///
    /// Returns `None` for an absent node, for an empty soul, and when no
    /// field matches.
    pub fn get_sync(&self, soul: &str, opts: &GetOptions) -> Result<Option<GunNode>> {
        if !is_readable(soul) {
            return Ok(None);
        }
        self.engine.read(|txn| self.read_node(txn, soul, opts))
    }

    /// Read a node as JSON text
    ///
    /// Identical to `serde_json::to_string(&get_sync(..)?)`, `"null"` when
    /// absent. A whole compact node is returned as stored, without decoding.
    pub fn get_json_string_sync(&self, soul: &str, opts: &GetOptions) -> Result<String> {
        if !is_readable(soul) {
            return Ok("null".to_string());
        }
        self.engine.read(|txn| {
            let primary = txn.get(keys::primary_key(soul));
            if opts.is_unbounded() && Representation::of(primary) == Representation::Compact {
                if let Some(bytes) = primary {
                    return String::from_utf8(bytes.to_vec()).map_err(|_| {
                        GunKvError::Storage(format!("record of {:?} is not UTF-8", soul))
                    });
                }
            }

            let node = self.read_node(txn, soul, opts)?;
            serde_json::to_string(&node).map_err(|e| GunKvError::Serialization(e.to_string()))
        })
    }

    pub async fn get(&self, soul: &str, opts: &GetOptions) -> Result<Option<GunNode>> {
        self.get_sync(soul, opts)
    }

    pub async fn get_json_string(&self, soul: &str, opts: &GetOptions) -> Result<String> {
        self.get_json_string_sync(soul, opts)
    }

    fn read_node<T: KvRead>(&self, txn: &T, soul: &str, opts: &GetOptions) -> Result<Option<GunNode>> {
        match Representation::of(txn.get(keys::primary_key(soul))) {
            Representation::Absent => Ok(None),
            Representation::Compact => self.compact().get(txn, soul, opts),
            Representation::Wide => self.wide().get(txn, soul, opts),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Merge `graph` into storage in one write transaction
    ///
    /// Returns the diff of every soul that changed, or `None` when nothing
    /// did. Empty souls are skipped. Any failure, including a soul inside
    /// the reserved `wide:` key space, aborts the whole batch.
    pub fn put_sync(&self, graph: &GunGraph) -> Result<Option<GunGraph>> {
        self.engine.write(|txn| {
            let mut diffs = GunGraph::new();

            for (soul, node) in graph {
                if soul.is_empty() {
                    continue;
                }
                if keys::is_reserved_soul(soul) {
                    return Err(GunKvError::InvalidSoul(soul.clone()));
                }

                let diff = match Representation::of(txn.get(keys::primary_key(soul))) {
                    Representation::Wide => self.wide().put(txn, soul, node)?,
                    Representation::Absent | Representation::Compact => {
                        self.compact().put(txn, soul, node)?
                    }
                };

                if let Some(diff) = diff {
                    diffs.insert(soul.clone(), diff);
                }
            }

            Ok(if diffs.is_empty() { None } else { Some(diffs) })
        })
    }

    pub async fn put(&self, graph: &GunGraph) -> Result<Option<GunGraph>> {
        self.put_sync(graph)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Checkpoint and sync the engine
    pub fn close(self) -> Result<()> {
        self.engine.close()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    fn wide(&self) -> WideStore<'_, R> {
        WideStore::new(&self.resolver, self.engine.config().get_max_keys)
    }

    fn compact(&self) -> CompactStore<'_, R> {
        CompactStore::new(&self.resolver, self.wide(), self.engine.config().wide_node_threshold)
    }
}

/// Souls that can name a stored node
fn is_readable(soul: &str) -> bool {
    !soul.is_empty() && !keys::is_reserved_soul(soul)
}
