//! SSTable Iterator
//!
//! Sequential iteration over a run of entries in an SSTable.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::error::Result;
use crate::memtable::MemTableEntry;

use super::{le_u32, le_u64, ENTRY_HEADER_SIZE, TOMBSTONE_MARKER};

/// Iterator over SSTable entries in sorted key order
pub struct SSTableIterator<'a> {
    file: &'a mut BufReader<File>,
    /// Stop reading when we reach this offset (start of index block)
    end_offset: u64,
    /// Current position in file
    current_offset: u64,
}

impl<'a> SSTableIterator<'a> {
    /// Create an iterator starting at `start_offset` inside the data block
    pub(super) fn new(file: &'a mut BufReader<File>, start_offset: u64, end_offset: u64) -> Result<Self> {
        file.seek(SeekFrom::Start(start_offset))?;
        Ok(Self {
            file,
            end_offset,
            current_offset: start_offset,
        })
    }

    fn read_entry(&mut self) -> Result<(Vec<u8>, MemTableEntry)> {
        let mut header = [0u8; ENTRY_HEADER_SIZE as usize];
        self.file.read_exact(&mut header)?;

        let key_len = le_u32(&header[0..4]) as usize;
        let val_len = le_u32(&header[4..8]);
        let expires_at = le_u64(&header[8..16]);

        let mut key = vec![0u8; key_len];
        self.file.read_exact(&mut key)?;

        let mut entry_size = ENTRY_HEADER_SIZE + key_len as u64;

        let entry = if val_len == TOMBSTONE_MARKER {
            MemTableEntry::Tombstone
        } else {
            let mut data = vec![0u8; val_len as usize];
            self.file.read_exact(&mut data)?;
            entry_size += val_len as u64;
            MemTableEntry::Value {
                data,
                expires_at: (expires_at != 0).then_some(expires_at),
            }
        };

        self.current_offset += entry_size;
        Ok((key, entry))
    }
}

impl<'a> Iterator for SSTableIterator<'a> {
    type Item = Result<(Vec<u8>, MemTableEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_offset >= self.end_offset {
            return None;
        }

        match self.read_entry() {
            Ok(item) => Some(Ok(item)),
            Err(e) => {
                // Do not keep reading past a bad entry
                self.current_offset = self.end_offset;
                Some(Err(e))
            }
        }
    }
}
