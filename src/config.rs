//! Configuration for gunkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{GunKvError, Result};

/// Default name of the node database inside `data_dir`
pub const DEFAULT_DB_NAME: &str = "gun-nodes";

/// Field count at which a compact node is rewritten as a wide node
pub const DEFAULT_WIDE_NODE_THRESHOLD: usize = 1100;

/// Maximum number of fields returned by a single wide-node range read
pub const DEFAULT_GET_MAX_KEYS: usize = 10_000;

/// Main configuration for a gunkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all databases
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {db_name}/
    ///           ├── wal.log          (write-ahead log)
    ///           └── sstables/        (checkpoint files)
    pub data_dir: PathBuf,

    /// Name of the node database (a directory under `data_dir`)
    pub db_name: String,

    /// Upper bound on the total bytes of keys and values held by the engine.
    /// A commit that would exceed it fails with `MapFull`.
    pub map_size: usize,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// WAL size (in bytes) after which a commit triggers a checkpoint
    pub wal_size_limit: u64,

    // -------------------------------------------------------------------------
    // Graph Configuration
    // -------------------------------------------------------------------------
    /// Field count that converts a compact node into a wide node
    pub wide_node_threshold: usize,

    /// Cap on fields returned from one wide-node read
    pub get_max_keys: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every commit (safest, slowest)
    EveryWrite,

    /// fsync after N commits (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./gunkv_data"),
            db_name: DEFAULT_DB_NAME.to_string(),
            map_size: 1024 * 1024 * 1024, // 1 GiB
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            wal_size_limit: 64 * 1024 * 1024, // 64 MB
            wide_node_threshold: DEFAULT_WIDE_NODE_THRESHOLD,
            get_max_keys: DEFAULT_GET_MAX_KEYS,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Directory holding the WAL and checkpoints of the node database
    pub fn db_dir(&self) -> PathBuf {
        self.data_dir.join(&self.db_name)
    }

    /// Reject settings the engine and adapter cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.db_name.is_empty() {
            return Err(GunKvError::Config("db_name must not be empty".to_string()));
        }
        if self.map_size == 0 {
            return Err(GunKvError::Config("map_size must be positive".to_string()));
        }
        if self.wide_node_threshold == 0 {
            return Err(GunKvError::Config(
                "wide_node_threshold must be positive".to_string(),
            ));
        }
        if self.get_max_keys == 0 {
            return Err(GunKvError::Config("get_max_keys must be positive".to_string()));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(GunKvError::Config(
                "WAL sync interval must be at least one entry".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the node database name
    pub fn db_name(mut self, name: impl Into<String>) -> Self {
        self.config.db_name = name.into();
        self
    }

    /// Set the map size (in bytes)
    pub fn map_size(mut self, size: usize) -> Self {
        self.config.map_size = size;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the WAL size that triggers a checkpoint (in bytes)
    pub fn wal_size_limit(mut self, size: u64) -> Self {
        self.config.wal_size_limit = size;
        self
    }

    /// Set the field count that converts a node to the wide representation
    pub fn wide_node_threshold(mut self, count: usize) -> Self {
        self.config.wide_node_threshold = count;
        self
    }

    /// Set the cap on fields returned from one wide-node read
    pub fn get_max_keys(mut self, count: usize) -> Self {
        self.config.get_max_keys = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
