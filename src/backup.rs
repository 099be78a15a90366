//! Backup files
//!
//! A backup holds the live records at the time it was taken; TTL deadlines
//! are not carried over, restored records never expire.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                    │
//! │   Magic: "LXBK" (4) | Version: u16 (2) | Count: u64  │
//! ├──────────────────────────────────────────────────────┤
//! │ Records: bincode BackupRecord, `Count` times         │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{LexiError, Result};
use crate::txn::{IterOptions, KvItem, WriteBatch};

const MAGIC: &[u8; 4] = b"LXBK";
const VERSION: u16 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BackupRecord {
    key: Vec<u8>,
    value: Vec<u8>,
}

/// Dump every live record of `engine` into a new file at `path`
pub(crate) fn write_backup(engine: &Engine, path: &Path) -> Result<u64> {
    let items: Vec<KvItem> = engine.view(|txn| Ok(txn.iter(IterOptions::default())?.collect()))?;

    let count = items.len() as u64;

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&count.to_le_bytes())?;

    for item in items {
        let (key, value) = item.into_parts();
        let record = BackupRecord {
            key,
            value: value.unwrap_or_default(),
        };
        bincode::serialize_into(&mut writer, &record)?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| LexiError::Storage(format!("Failed to flush backup: {}", e)))?
        .sync_all()?;

    tracing::info!("Backed up {} records to {}", count, path.display());
    Ok(count)
}

fn read_header(reader: &mut impl Read) -> Result<u64> {
    let mut header = [0u8; 14];
    reader.read_exact(&mut header)?;

    if &header[0..4] != MAGIC {
        return Err(LexiError::Storage(format!(
            "Invalid backup magic: expected LXBK, got {:?}",
            &header[0..4]
        )));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(LexiError::Storage(format!(
            "Unsupported backup version: {}",
            version
        )));
    }

    let mut count = [0u8; 8];
    count.copy_from_slice(&header[6..14]);
    Ok(u64::from_le_bytes(count))
}

/// Apply every record of a backup file to `engine`, `batch_size` writes per
/// commit
///
/// The whole file is decoded before the first commit, so a damaged file
/// applies nothing. A commit failure part way through still leaves the
/// earlier batches applied.
pub(crate) fn read_backup(engine: &Engine, path: &Path, batch_size: usize) -> Result<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let count = read_header(&mut reader)?;

    let mut records = Vec::new();
    for _ in 0..count {
        let record: BackupRecord = bincode::deserialize_from(&mut reader)?;
        records.push(record);
    }

    let mut batch = WriteBatch::new();
    for record in records {
        batch.set(record.key, record.value);

        if batch.len() >= batch_size {
            engine.write_batch(std::mem::take(&mut batch))?;
        }
    }
    if !batch.is_empty() {
        engine.write_batch(batch)?;
    }

    tracing::info!("Restored {} records from {}", count, path.display());
    Ok(count)
}
