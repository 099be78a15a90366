//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{LexiError, Result};

/// LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair, optionally expiring at a unix-millis deadline
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        expires_at: Option<u64>,
    },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Several operations committed as one unit
    Batch { ops: Vec<Operation> },
}

impl Operation {
    /// Plain put without expiry
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Operation::Put {
            key: key.into(),
            value: value.into(),
            expires_at: None,
        }
    }

    /// Delete of a single key
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Operation::Delete { key: key.into() }
    }
}

/// Payload encoded into the `Data` section
#[derive(Serialize, Deserialize)]
struct Payload {
    operation: Operation,
    timestamp: u64,
}

/// Current unix time in milliseconds
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Unix-millis deadline `ttl` from now
pub(crate) fn expiry_after(ttl: Duration) -> u64 {
    now_millis().saturating_add(ttl.as_millis().min(u64::MAX as u128) as u64)
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        Self {
            lsn,
            operation,
            timestamp: now_millis(),
        }
    }

    fn encode_payload(&self) -> Result<Vec<u8>> {
        let payload = Payload {
            operation: self.operation.clone(),
            timestamp: self.timestamp,
        };
        Ok(bincode::serialize(&payload)?)
    }

    fn crc_of(lsn: u64, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_le_bytes());
        hasher.update(data);
        hasher.finalize()
    }

    /// CRC over LSN and encoded payload
    pub fn compute_crc(&self) -> Result<u32> {
        let data = self.encode_payload()?;
        Ok(Self::crc_of(self.lsn, &data))
    }

    /// Encode into the on-disk frame
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = self.encode_payload()?;
        let len = u32::try_from(data.len())
            .map_err(|_| LexiError::WalWrite(format!("entry too large: {} bytes", data.len())))?;
        let crc = Self::crc_of(self.lsn, &data);

        let mut buf = Vec::with_capacity(HEADER_SIZE + data.len());
        buf.extend_from_slice(&self.lsn.to_le_bytes());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&data);
        Ok(buf)
    }

    /// Size of the encoded frame in bytes
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(HEADER_SIZE + bincode::serialized_size(&Payload {
            operation: self.operation.clone(),
            timestamp: self.timestamp,
        })? as usize)
    }

    /// Decode one frame; trailing bytes after the frame are ignored
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (lsn, crc, len) = Self::parse_header(bytes)?;

        let end = HEADER_SIZE + len;
        if bytes.len() < end {
            return Err(LexiError::WalCorruption(format!(
                "truncated entry: need {} bytes, have {}",
                end,
                bytes.len()
            )));
        }

        let data = &bytes[HEADER_SIZE..end];
        if Self::crc_of(lsn, data) != crc {
            return Err(LexiError::WalCorruption(format!("CRC mismatch at LSN {}", lsn)));
        }

        let payload: Payload = bincode::deserialize(data)
            .map_err(|e| LexiError::WalCorruption(format!("undecodable payload: {}", e)))?;

        Ok(Self {
            lsn,
            operation: payload.operation,
            timestamp: payload.timestamp,
        })
    }

    /// Parse `(lsn, crc, data_len)` from the start of a frame
    pub(crate) fn parse_header(bytes: &[u8]) -> Result<(u64, u32, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(LexiError::WalCorruption(format!(
                "header too small: {} bytes",
                bytes.len()
            )));
        }
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);
        Ok((
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len) as usize,
        ))
    }
}
