//! Engine Module
//!
//! The embedded ordered key-value engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Hand out snapshot read transactions and the single write transaction
//! - Checkpoint when the WAL grows past its limit
//! - Manage crash recovery on startup

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::Result;
use crate::memtable::Snapshot;
use crate::storage::StorageManager;
use crate::txn::{KvRead, ReadTxn, WriteTxn};
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes**: a `WriteTxn` holds the `wal` mutex from begin to
///   commit/abort, so only ONE write transaction exists at a time.
///
/// - **Reads**: a `ReadTxn` clones the committed `Snapshot` and works on
///   it. It never waits for a write transaction; the `committed` lock is
///   only held while a commit swaps in its changes.
///
/// ## Commit cost
///
/// A commit made while no reader holds the committed base writes into it in
/// place. While a reader does, the commit adds a delta layer instead, costing
/// O(commit size) plus the amortized layer merges described in
/// `memtable::snapshot`. The base is copied only when the oldest layer has
/// grown to half its size.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory of this node database
    db_dir: PathBuf,

    /// Directory for checkpoint SSTables
    storage_dir: PathBuf,

    /// Latest committed table
    committed: RwLock<Snapshot>,

    /// Write-ahead log; its lock is the writer lock
    wal: Mutex<WalWriter>,

    /// Checkpoint storage
    storage: StorageManager,

    /// Cursors currently open across all transactions
    open_cursors: AtomicUsize,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create the database directory
    /// 2. Load the newest checkpoint
    /// 3. Replay the WAL on top of it
    /// 4. Checkpoint the replayed state and truncate the WAL
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Compute paths (derived from data_dir, not configurable)
        let db_dir = config.db_dir();
        let storage_dir = db_dir.join(Self::SSTABLE_DIR);
        let wal_path = db_dir.join(Self::WAL_FILENAME);
        fs::create_dir_all(&db_dir)?;

        // Step 2: Load the last checkpoint
        let storage = StorageManager::open(&storage_dir)?;
        let mut table = storage.load()?;

        // Step 3: Replay committed transactions the checkpoint does not hold
        let mut replayed = 0;
        let mut next_lsn = 1;
        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    recovered = recovery.entries_recovered,
                    corrupted = recovery.entries_corrupted,
                    last_lsn = recovery.last_lsn,
                    truncated = recovery.was_truncated,
                    "WAL recovery"
                );
            }

            for entry in entries {
                for operation in entry.operations {
                    match operation {
                        Operation::Put { key, value } => {
                            table.put(key, value);
                        }
                    }
                }
            }

            replayed = recovery.entries_recovered;
            next_lsn = recovery.last_lsn + 1;
        }

        let mut wal = WalWriter::open_at(&wal_path, config.wal_sync_strategy, next_lsn)?;

        // Step 4: Make the replayed state durable in a checkpoint
        if replayed > 0 {
            tracing::info!(entries = table.entry_count(), "checkpointing recovered state");
            storage.checkpoint(&table)?;
            wal.truncate()?;
        }

        Ok(Self {
            config,
            db_dir,
            storage_dir,
            committed: RwLock::new(Snapshot::new(table)),
            wal: Mutex::new(wal),
            storage,
            open_cursors: AtomicUsize::new(0),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Begin a read-only transaction on the current snapshot
    pub fn begin_read(&self) -> ReadTxn<'_> {
        let snapshot = self.committed.read().clone();
        ReadTxn::new(snapshot, &self.open_cursors)
    }

    /// Begin the write transaction, waiting for any other writer to finish
    pub fn begin_write(&self) -> WriteTxn<'_> {
        let wal = self.wal.lock();
        let base = self.committed.read().clone();
        WriteTxn::new(self, wal, base)
    }

    /// Run `body` in a read-only transaction
    pub fn read<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&ReadTxn<'_>) -> Result<T>,
    {
        let txn = self.begin_read();
        body(&txn).map_err(|e| {
            tracing::warn!(error = %e, "read transaction failed");
            e
        })
    }

    /// Run `body` in a write transaction
    ///
    /// Commits when `body` returns `Ok`. When `body` fails the transaction is
    /// aborted and the error is returned unchanged; a failed commit is
    /// returned the same way. Nothing of a failed call is ever applied.
    pub fn write<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T>,
    {
        let mut txn = self.begin_write();
        match body(&mut txn) {
            Ok(value) => {
                txn.commit().map_err(|e| {
                    tracing::error!(error = %e, "write transaction commit failed");
                    e
                })?;
                Ok(value)
            }
            Err(e) => {
                tracing::error!(error = %e, "write transaction aborted");
                txn.abort();
                Err(e)
            }
        }
    }

    // =========================================================================
    // Single-key convenience operations
    // =========================================================================

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.begin_read().get(key).map(<[u8]>::to_vec)
    }

    /// Put a key-value pair in its own transaction
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(|txn| {
            txn.put(key, value);
            Ok(())
        })
    }

    // =========================================================================
    // Checkpointing and shutdown
    // =========================================================================

    /// Write a checkpoint now and truncate the WAL
    pub fn checkpoint(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        self.checkpoint_locked(&mut wal)
    }

    /// Close the engine gracefully
    ///
    /// Checkpoints any state still only in the WAL and syncs to disk
    pub fn close(self) -> Result<()> {
        let mut wal = self.wal.lock();
        if wal.size() > 0 {
            self.checkpoint_locked(&mut wal)?;
        }
        wal.sync()
    }

    /// Apply committed operations to the shared table
    ///
    /// Called with the WAL lock held, after the entry is in the WAL.
    pub(crate) fn publish(&self, operations: Vec<Operation>) {
        self.committed.write().apply(operations);
    }

    /// Checkpoint if the WAL has outgrown its limit
    ///
    /// The commit that calls this is already durable in the WAL, so a failed
    /// checkpoint is logged and retried on a later commit.
    pub(crate) fn maybe_checkpoint(&self, wal: &mut WalWriter) {
        if wal.size() < self.config.wal_size_limit {
            return;
        }
        if let Err(e) = self.checkpoint_locked(wal) {
            tracing::warn!(error = %e, wal_bytes = wal.size(), "checkpoint failed");
        }
    }

    fn checkpoint_locked(&self, wal: &mut WalWriter) -> Result<()> {
        let snapshot = self.committed.read().clone();
        let sstable = self.storage.checkpoint(&snapshot)?;
        wal.truncate()?;
        tracing::debug!(
            entries = sstable.entry_count(),
            bytes = sstable.file_size,
            "checkpoint written"
        );
        Ok(())
    }

    pub(crate) fn cursor_counter(&self) -> &AtomicUsize {
        &self.open_cursors
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the node database directory
    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    /// Get the storage directory path (where checkpoints are stored)
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Number of committed keys
    pub fn entry_count(&self) -> usize {
        self.committed.read().entry_count()
    }

    /// Delta layers over the committed base
    pub fn snapshot_layers(&self) -> usize {
        self.committed.read().layer_count()
    }

    /// Total committed key and value bytes
    pub fn size(&self) -> usize {
        self.committed.read().size()
    }

    /// Current WAL length in bytes
    pub fn wal_size(&self) -> u64 {
        self.wal.lock().size()
    }

    /// Get the number of checkpoint SSTables on disk
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Cursors currently open
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
