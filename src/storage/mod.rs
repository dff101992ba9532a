//! Storage Module
//!
//! Persistent checkpoints of the engine's table in SSTable format.
//!
//! ## Responsibilities
//! - Persist the whole table to disk in sorted format
//! - Reload it on startup, before the WAL is replayed on top
//! - Keep only the newest checkpoint
//!
//! A checkpoint holds every live key, so the WAL can be truncated once one is
//! written. See `sstable` for the file format.

mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
pub use manager::StorageManager;
