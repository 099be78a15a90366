//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//! - Merge the table set when enough of it is garbage

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{LexiError, Result};
use crate::memtable::{MemTable, MemTableEntry};

use super::{SSTable, SSTableBuilder, SSTableReader};

/// What a maintenance pass did
#[derive(Debug, Clone, PartialEq)]
pub enum MaintenanceOutcome {
    /// Not enough garbage to justify a rewrite
    Skipped {
        /// Fraction of stored records that are garbage (0.0 when empty)
        reclaimable: f64,
    },
    /// All tables were merged into at most one
    Compacted {
        tables_merged: usize,
        entries_dropped: u64,
        bytes_reclaimed: u64,
    },
}

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `next_sstable_id`: Atomic counter (lock-free)
/// - Callers serialize `flush` and `compact` against each other; the engine
///   does this with its write lock
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<SSTableReader>>,

    /// Next ID for creating new SSTables (atomic, lock-free)
    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing SSTable files
    /// 3. Open readers for each (loads indexes into RAM)
    /// 4. Order by ID descending (newest first)
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_sstable_id(&file_path) {
                    sstable_ids.push(id);
                }
            }
        }

        // Newest first (highest ID first)
        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut sstables = Vec::with_capacity(sstable_ids.len());
        for id in &sstable_ids {
            sstables.push(SSTableReader::open(&Self::sstable_path_with_dir(path, *id))?);
        }

        let next_id = sstable_ids.first().map(|&id| id + 1).unwrap_or(1);

        tracing::debug!(
            "Opened storage at {} with {} SSTables",
            path.display(),
            sstables.len()
        );

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Get the newest entry for a key (searches SSTables newest → oldest)
    ///
    /// Tombstones are returned as-is so callers can tell "deleted" from
    /// "never written".
    pub fn get(&self, key: &[u8]) -> Result<Option<MemTableEntry>> {
        let sstables = self.sstables.read();

        for reader in sstables.iter() {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(entry) = reader.get(key)? {
                return Ok(Some(entry));
            }
        }

        Ok(None)
    }

    /// Newest entry per key for every key starting with `prefix`
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<BTreeMap<Vec<u8>, MemTableEntry>> {
        let sstables = self.sstables.read();
        let mut merged = BTreeMap::new();

        // Oldest first so newer tables overwrite
        for reader in sstables.iter().rev() {
            for (key, entry) in reader.scan_prefix(prefix)? {
                merged.insert(key, entry);
            }
        }

        Ok(merged)
    }

    /// Flush a MemTable to a new SSTable
    ///
    /// Creates a new SSTable file from the MemTable's sorted entries,
    /// opens a reader for it, and adds it to the front of the list.
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(LexiError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for (key, entry) in memtable.iter() {
            builder.add_entry(&key, &entry)?;
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open(&path)?;
        self.sstables.write().insert(0, reader);

        tracing::debug!(
            "Flushed {} entries to {}",
            metadata.entry_count,
            path.display()
        );

        Ok(metadata)
    }

    /// Merge every SSTable into one if at least `reclaim_ratio` of the stored
    /// records are garbage at time `now` (unix millis)
    ///
    /// With all tables merged nothing older remains underneath, so tombstones
    /// and expired values can be dropped outright.
    pub fn compact(&self, reclaim_ratio: f64, now: u64) -> Result<MaintenanceOutcome> {
        let mut sstables = self.sstables.write();

        let total: u64 = sstables.iter().map(|r| r.entry_count()).sum();
        if total == 0 {
            return Ok(MaintenanceOutcome::Skipped { reclaimable: 0.0 });
        }

        let mut merged = BTreeMap::new();
        for reader in sstables.iter().rev() {
            for (key, entry) in reader.entries()? {
                merged.insert(key, entry);
            }
        }
        merged.retain(|_, entry| entry.live_value(now).is_some());

        let live = merged.len() as u64;
        let reclaimable = (total - live) as f64 / total as f64;
        if reclaimable < reclaim_ratio {
            return Ok(MaintenanceOutcome::Skipped { reclaimable });
        }

        let old_size: u64 = sstables.iter().map(|r| r.file_size()).sum();
        let old_paths: Vec<PathBuf> = sstables.iter().map(|r| r.path().to_path_buf()).collect();

        let mut replacement = Vec::new();
        if !merged.is_empty() {
            let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
            let path = self.sstable_path(id);
            let mut builder = SSTableBuilder::new(&path)?;
            for (key, entry) in &merged {
                builder.add_entry(key, entry)?;
            }
            builder.finish()?;
            replacement.push(SSTableReader::open(&path)?);
        }

        let new_size: u64 = replacement.iter().map(|r| r.file_size()).sum();
        let tables_merged = sstables.len();
        *sstables = replacement;

        for path in old_paths {
            fs::remove_file(&path)?;
        }

        Ok(MaintenanceOutcome::Compacted {
            tables_merged,
            entries_dropped: total - live,
            bytes_reclaimed: old_size.saturating_sub(new_size),
        })
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Total records stored across all SSTables, garbage included
    pub fn total_entries(&self) -> u64 {
        self.sstables.read().iter().map(|r| r.entry_count()).sum()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Generate the file path for an SSTable with given ID
    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    /// Generate SSTable path given a directory and ID
    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// Parse SSTable ID from filename
    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("sstable_")?;
        id_str.parse().ok()
    }
}
