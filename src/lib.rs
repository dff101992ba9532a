//! # gunkv
//!
//! Embedded storage for GUN graph nodes:
//! - CRDT-resolved writes (field-wise last-write-wins by default)
//! - Compact nodes stored as one JSON record, wide nodes as one record per field
//! - Atomic multi-node writes, snapshot reads
//! - Write-Ahead Logging (WAL) with crash recovery and checkpoints
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     GraphAdapter                             │
//! │          get / get_json_string / put (+ async)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  primary record → Representation
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐      ┌─────────────┐
//!   │  Compact    │─promote─▶│    Wide     │      │ CrdtResolver│
//!   │   Store     │          │   Store     │◀────▶│ diff / merge│
//!   └──────┬──────┘          └──────┬──────┘      └─────────────┘
//!          └────────────┬────────────┘
//!                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                                │
//! │        ReadTxn (snapshot) / WriteTxn (single writer)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (layered)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  (SSTable)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod txn;
pub mod engine;
pub mod graph;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GunKvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use graph::{
    CrdtResolver, FnResolver, GetOptions, GraphAdapter, GunGraph, GunNode, GunValue, HamResolver,
    Representation,
};
pub use txn::{KvRead, ReadTxn, WriteTxn};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of gunkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
