//! SSTable Reader
//!
//! Opens SSTable files, validating header, footer and data checksum.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{GunKvError, Result};

use super::iterator::SSTableIterator;
use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Reader for SSTable files
///
/// The data block is loaded into memory on open; checkpoints are always
/// read whole.
pub struct SSTableReader {
    data: Vec<u8>,
    entry_count: u64,
}

impl SSTableReader {
    /// Open an SSTable for reading
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        if (bytes.len() as u64) < HEADER_SIZE + FOOTER_SIZE {
            return Err(GunKvError::Storage(format!(
                "SSTable {} too short: {} bytes",
                path.display(),
                bytes.len()
            )));
        }

        // Read and validate header
        if &bytes[0..4] != MAGIC {
            return Err(GunKvError::Storage(format!(
                "Invalid SSTable magic: expected GKV1, got {:?}",
                &bytes[0..4]
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(GunKvError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let entry_count = read_u64(&bytes[6..14]);

        // Footer sits at the very end
        let footer_start = bytes.len() - FOOTER_SIZE as usize;
        let footer = &bytes[footer_start..];
        let data_end = read_u64(&footer[0..8]);
        let data_crc = u32::from_le_bytes([footer[8], footer[9], footer[10], footer[11]]);

        if data_end != footer_start as u64 {
            return Err(GunKvError::Storage(format!(
                "SSTable {} data end {} does not match footer position {}",
                path.display(),
                data_end,
                footer_start
            )));
        }

        bytes.truncate(footer_start);
        let data = bytes.split_off(HEADER_SIZE as usize);

        let actual = crc32fast::hash(&data);
        if actual != data_crc {
            return Err(GunKvError::Storage(format!(
                "SSTable {} checksum mismatch: stored {:#010x}, computed {:#010x}",
                path.display(),
                data_crc,
                actual
            )));
        }

        Ok(Self { data, entry_count })
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> SSTableIterator<'_> {
        SSTableIterator::new(&self.data)
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}
