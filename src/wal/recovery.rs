//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::Result;

use super::{WalEntry, HEADER_SIZE};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// Complete frames with a bad CRC are skipped and counted. A partial
    /// frame at the tail is cut off the file.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let bytes = fs::read(path)?;
        let (entries, mut result, valid_len) = Self::scan(&bytes);

        if valid_len < bytes.len() {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let bytes = fs::read(path)?;
        let (_, mut result, valid_len) = Self::scan(&bytes);
        result.was_truncated = valid_len < bytes.len();
        Ok(result)
    }

    /// Walk frames, returning good entries and the length of the well-formed
    /// prefix of the buffer
    fn scan(bytes: &[u8]) -> (Vec<WalEntry>, RecoveryResult, usize) {
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();
        let mut offset = 0;

        while offset < bytes.len() {
            let rest = &bytes[offset..];
            let len = match WalEntry::parse_header(rest) {
                Ok((_, _, len)) => len,
                Err(_) => break, // partial header
            };
            if rest.len() < HEADER_SIZE + len {
                break; // partial body
            }

            match WalEntry::deserialize(rest) {
                Ok(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                }
                Err(e) => {
                    tracing::warn!("Skipping corrupted WAL entry at offset {}: {}", offset, e);
                    result.entries_corrupted += 1;
                }
            }
            offset += HEADER_SIZE + len;
        }

        (entries, result, offset)
    }
}
