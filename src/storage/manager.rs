//! Storage Manager
//!
//! Manages checkpoint SSTables.
//!
//! ## Responsibilities
//! - Discover existing checkpoints on startup
//! - Load the newest checkpoint into a MemTable
//! - Write a new checkpoint from a committed snapshot
//! - Remove checkpoints made obsolete by a newer one

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::Result;
use crate::memtable::MemTable;

use super::{SSTable, SSTableBuilder, SSTableReader};

const SSTABLE_EXTENSION: &str = "sst";
const TEMP_EXTENSION: &str = "tmp";

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock (ids of checkpoints on disk, oldest first)
/// - `next_sstable_id`: Atomic counter (lock-free)
/// - All methods use `&self`; the engine only checkpoints while holding its
///   writer lock, so two checkpoints never race
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Ids of checkpoint files on disk, ascending
    sstables: RwLock<Vec<u64>>,

    /// Next ID for creating new SSTables (atomic, lock-free)
    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Remove half-written checkpoints left by a crash
    /// 3. Discover existing SSTable files
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids: Vec<u64> = Vec::new();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();

            if !file_path.is_file() {
                continue;
            }

            if file_path.extension().and_then(|e| e.to_str()) == Some(TEMP_EXTENSION) {
                tracing::warn!(path = %file_path.display(), "removing incomplete checkpoint");
                fs::remove_file(&file_path)?;
                continue;
            }

            if let Some(id) = Self::parse_sstable_id(&file_path) {
                sstable_ids.push(id);
            }
        }

        sstable_ids.sort_unstable();

        // Next ID = max + 1, or 1 if no SSTables exist
        let next_id = sstable_ids.last().map(|&id| id + 1).unwrap_or(1);

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstable_ids),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Load the newest checkpoint, or an empty table if there is none
    pub fn load(&self) -> Result<MemTable> {
        let mut table = MemTable::new();

        let latest = self.sstables.read().last().copied();
        if let Some(id) = latest {
            let reader = SSTableReader::open(&self.sstable_path(id))?;
            for entry in reader.iter() {
                let (key, value) = entry?;
                table.put(key.to_vec(), value.to_vec());
            }
            tracing::debug!(
                sstable_id = id,
                entries = reader.entry_count(),
                "loaded checkpoint"
            );
        }

        Ok(table)
    }

    /// Write `entries`, in sorted key order, as a new checkpoint and delete
    /// older ones
    ///
    /// The file is written under a temporary name and renamed into place,
    /// so a crash never leaves a partial checkpoint that looks complete.
    pub fn checkpoint<'a, I>(&self, entries: I) -> Result<SSTable>
    where
        I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
    {
        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);
        let temp_path = path.with_extension(TEMP_EXTENSION);

        let mut builder = SSTableBuilder::new(&temp_path)?;
        for (key, value) in entries {
            builder.add(key, value)?;
        }
        let mut metadata = builder.finish()?;

        fs::rename(&temp_path, &path)?;
        metadata.path = path;

        let obsolete: Vec<u64> = {
            let mut sstables = self.sstables.write();
            let old = std::mem::take(&mut *sstables);
            sstables.push(id);
            old
        };

        for old_id in obsolete {
            if let Err(e) = fs::remove_file(self.sstable_path(old_id)) {
                tracing::warn!(sstable_id = old_id, error = %e, "failed to remove old checkpoint");
            }
        }

        Ok(metadata)
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Generate the file path for an SSTable with given ID
    fn sstable_path(&self, id: u64) -> PathBuf {
        self.data_dir.join(format!("sstable_{:06}.{}", id, SSTABLE_EXTENSION))
    }

    /// Parse SSTable ID from filename
    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()?.to_str()? != SSTABLE_EXTENSION {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("sstable_")?;
        id_str.parse().ok()
    }
}
