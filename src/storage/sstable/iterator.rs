//! SSTable Iterator
//!
//! Sequential iteration over all entries in an SSTable data block.

use crate::error::{GunKvError, Result};

use super::ENTRY_HEADER_SIZE;

/// Iterator over SSTable entries in sorted key order
pub struct SSTableIterator<'a> {
    data: &'a [u8],
    /// Current position in the data block
    offset: usize,
    /// Set after the first malformed entry
    failed: bool,
}

impl<'a> SSTableIterator<'a> {
    pub(super) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    fn malformed(&mut self, what: &str) -> Option<Result<(&'a [u8], &'a [u8])>> {
        self.failed = true;
        Some(Err(GunKvError::Storage(format!(
            "SSTable entry at data offset {} malformed: {}",
            self.offset, what
        ))))
    }
}

impl<'a> Iterator for SSTableIterator<'a> {
    type Item = Result<(&'a [u8], &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        let data = self.data;
        let rest = &data[self.offset..];
        if rest.len() < ENTRY_HEADER_SIZE {
            return self.malformed("truncated entry header");
        }

        let key_len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let val_len = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;

        let key_end = ENTRY_HEADER_SIZE + key_len;
        let value_end = key_end + val_len;
        if rest.len() < value_end {
            return self.malformed("entry runs past data block");
        }

        let key = &rest[ENTRY_HEADER_SIZE..key_end];
        let value = &rest[key_end..value_end];
        self.offset += value_end;

        Some(Ok((key, value)))
    }
}
