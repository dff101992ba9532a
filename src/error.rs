//! Error types for gunkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using GunKvError
pub type Result<T> = std::result::Result<T, GunKvError>;

/// Unified error type for gunkv operations
#[derive(Debug, Error)]
pub enum GunKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Map full: commit needs {required} bytes, map size is {map_size}")]
    MapFull { required: usize, map_size: usize },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to decode record at {key:?}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // -------------------------------------------------------------------------
    // Graph Errors
    // -------------------------------------------------------------------------
    #[error("Invalid soul {0:?}")]
    InvalidSoul(String),

    #[error("CRDT resolver error: {0}")]
    Resolver(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GunKvError {
    /// Wrap a JSON decoding failure with the storage key it came from
    pub fn decode(key: &[u8], source: serde_json::Error) -> Self {
        GunKvError::Decode {
            key: String::from_utf8_lossy(key).into_owned(),
            source,
        }
    }
}

impl From<bincode::Error> for GunKvError {
    fn from(e: bincode::Error) -> Self {
        GunKvError::Serialization(e.to_string())
    }
}
