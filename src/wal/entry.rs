//! WAL Entry definitions
//!
//! One entry holds every write of one committed transaction.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{GunKvError, Result};

/// Header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The writes of one transaction, in commit order
    pub operations: Vec<Operation>,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },
}

/// The checksummed part of an entry, as read back
#[derive(Deserialize)]
struct Payload {
    operations: Vec<Operation>,
    timestamp: u64,
}

/// The checksummed part of an entry, as written
#[derive(Serialize)]
struct PayloadRef<'a> {
    operations: &'a [Operation],
    timestamp: u64,
}

impl WalEntry {
    pub fn new(lsn: u64, operations: Vec<Operation>) -> Self {
        Self {
            lsn,
            operations,
            timestamp: now_millis(),
        }
    }

    /// Encode as `[LSN][CRC][Len][payload]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Self::encode(self.lsn, &self.operations, self.timestamp)
    }

    /// Encode an entry without building a `WalEntry` first
    pub(crate) fn encode(lsn: u64, operations: &[Operation], timestamp: u64) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&PayloadRef {
            operations,
            timestamp,
        })?;

        let len = u32::try_from(payload.len()).map_err(|_| {
            GunKvError::Serialization(format!("WAL entry too large: {} bytes", payload.len()))
        })?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&lsn.to_le_bytes());
        bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(&payload);

        Ok(bytes)
    }

    /// Decode one complete entry, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let header = parse_header(bytes)?;
        let end = HEADER_SIZE + header.len as usize;

        if bytes.len() < end {
            return Err(GunKvError::WalCorruption(format!(
                "entry {} truncated: expected {} payload bytes, found {}",
                header.lsn,
                header.len,
                bytes.len() - HEADER_SIZE
            )));
        }

        let payload = &bytes[HEADER_SIZE..end];
        let actual = crc32fast::hash(payload);
        if actual != header.crc {
            return Err(GunKvError::WalCorruption(format!(
                "CRC mismatch for entry {}: stored {:#010x}, computed {:#010x}",
                header.lsn, header.crc, actual
            )));
        }

        let payload: Payload = bincode::deserialize(payload).map_err(|e| {
            GunKvError::WalCorruption(format!("entry {} payload unreadable: {}", header.lsn, e))
        })?;

        Ok(Self {
            lsn: header.lsn,
            operations: payload.operations,
            timestamp: payload.timestamp,
        })
    }
}

/// Fixed-size prefix of every entry
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntryHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

pub(crate) fn parse_header(bytes: &[u8]) -> Result<EntryHeader> {
    if bytes.len() < HEADER_SIZE {
        return Err(GunKvError::WalCorruption(format!(
            "entry header truncated: {} of {} bytes",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    let mut lsn = [0u8; 8];
    let mut crc = [0u8; 4];
    let mut len = [0u8; 4];
    lsn.copy_from_slice(&bytes[0..8]);
    crc.copy_from_slice(&bytes[8..12]);
    len.copy_from_slice(&bytes[12..16]);

    Ok(EntryHeader {
        lsn: u64::from_le_bytes(lsn),
        crc: u32::from_le_bytes(crc),
        len: u32::from_le_bytes(len),
    })
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
