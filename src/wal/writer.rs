//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::entry::now_millis;
use super::{Operation, WalEntry};

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// LSN assigned to the next appended entry
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries appended since the last fsync
    unsynced: usize,
    /// Current file length in bytes
    size: u64,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// Existing content is kept; new entries are appended after it.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        Self::open_at(path, sync_strategy, 1)
    }

    /// Open or create a WAL file, numbering new entries from `next_lsn`
    pub fn open_at(path: &Path, sync_strategy: WalSyncStrategy, next_lsn: u64) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let size = file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_lsn: next_lsn.max(1),
            sync_strategy,
            unsynced: 0,
            size,
        })
    }

    /// Append one transaction's operations as a single entry
    ///
    /// Returns the LSN assigned to the entry.
    pub fn append(&mut self, operations: &[Operation]) -> Result<u64> {
        let lsn = self.current_lsn;
        let bytes = WalEntry::encode(lsn, operations, now_millis())?;

        if let Err(e) = self.file.write_all(&bytes).and_then(|_| self.file.flush()) {
            // A torn entry would hide every later one from recovery
            if let Err(cut) = self.file.set_len(self.size) {
                tracing::error!(error = %cut, "failed to cut torn WAL entry");
            }
            return Err(e.into());
        }
        self.size += bytes.len() as u64;
        self.current_lsn += 1;
        self.unsynced += 1;

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if should_sync {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Drop every entry (after a checkpoint made them redundant)
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        self.size = 0;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the LSN the next entry will receive
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Current WAL length in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Entries appended but not yet fsynced
    pub fn unsynced_entries(&self) -> usize {
        self.unsynced
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
