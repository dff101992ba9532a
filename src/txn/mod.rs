//! Transaction Module
//!
//! Atomic units of work against the engine.
//!
//! ## Model
//! - `ReadTxn`: point-in-time snapshot, any number at once, never blocked by
//!   the writer
//! - `WriteTxn`: exactly one at a time; buffered writes published on commit
//!   as one WAL entry
//!
//! Both implement `KvRead`, so code that only reads can run in either.
//! Use `Engine::read` / `Engine::write` to get commit-or-abort handling.

mod cursor;
mod read;
mod write;

pub use cursor::Cursor;
pub use read::ReadTxn;
pub use write::WriteTxn;

/// Read access shared by both transaction kinds
pub trait KvRead {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Option<&[u8]>;

    /// Open a cursor at the first key `>= start`, walking keys in byte order
    fn cursor(&self, start: &[u8]) -> Cursor<'_>;
}
