//! MemTable Module
//!
//! In-memory ordered tables holding the committed key space.
//!
//! ## Responsibilities
//! - Fast point reads and ordered range reads
//! - Serve as the immutable snapshot behind read transactions
//! - Track size for the map-size limit
//! - Ordered iteration for checkpoint creation
//!
//! ## Data Structure Choice
//! A `BTreeMap` per table, stacked into a `Snapshot`:
//! - Ordered keys (required for range scans and SSTable generation)
//! - A reader clones the snapshot's `Arc`s and never blocks the writer
//! - A commit writes into the base in place when no reader holds it, and
//!   otherwise adds a delta layer, so it never copies the whole table on
//!   account of a reader

mod table;
mod snapshot;

pub use table::{MemTable, MemTableIterator};
pub use snapshot::{Snapshot, SnapshotIterator};
