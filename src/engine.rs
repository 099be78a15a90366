//! Engine Module
//!
//! The storage handle: one open session over WAL, MemTable and SSTables.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Closure-scoped read/write transactions and key enumeration
//! - Key/value helpers (TTL, typed values, batches, backup/restore)
//! - Maintenance passes that reclaim space from garbage records
//! - Crash recovery on startup, flush on close

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backup;
use crate::codec;
use crate::config::Config;
use crate::error::{LexiError, Result};
use crate::memtable::MemTable;
use crate::storage::{MaintenanceOutcome, StorageManager};
use crate::txn::{IterOptions, ReadTxn, WriteBatch, WriteTxn};
use crate::wal::{now_millis, Operation, WalRecovery, WalWriter};

/// The storage handle
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (update/batch/flush/maintenance): Serialized by `write_lock`
///   - Must acquire: write_lock → WAL → memtable → storage
/// - **Reads** (view/get/iter): No write_lock needed
///   - MemTable and StorageManager each take their own shared locks
///
/// Every public operation fails with `LexiError::Closed` once `close()` ran.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Directory for all data files (SSTables)
    storage_dir: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    /// Serializes write operations
    write_lock: Mutex<()>,

    /// Set once by `close()`
    closed: AtomicBool,

    /// Committed write transactions since open
    commits: AtomicU64,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load existing SSTables
    /// 3. Replay the WAL if present and flush what it held
    /// 4. Start a fresh WAL
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }

            for entry in entries {
                Self::apply(&memtable, entry.operation);
            }

            // Recovered data must be durable before the WAL is reset
            if !memtable.is_empty() {
                tracing::info!("Flushing {} recovered entries to SSTable", memtable.entry_count());
                storage.flush(&memtable)?;
                memtable.clear();
            }
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        tracing::debug!("Engine opened at {}", config.data_dir.display());

        Ok(Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            commits: AtomicU64::new(0),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Run a read-only transaction
    pub fn view<T>(&self, f: impl FnOnce(&ReadTxn<'_>) -> Result<T>) -> Result<T> {
        self.ensure_open()?;
        f(&ReadTxn::new(self))
    }

    /// Run a read-write transaction, committing its writes if `f` succeeds
    pub fn update<T>(&self, f: impl FnOnce(&mut WriteTxn<'_>) -> Result<T>) -> Result<T> {
        let _write_guard = self.lock_writes()?;
        self.ensure_open()?;

        let mut txn = WriteTxn::new(self);
        let out = f(&mut txn)?;
        self.commit_locked(txn.into_batch())?;
        Ok(out)
    }

    /// Build and commit a write batch atomically
    pub fn batch(&self, f: impl FnOnce(&mut WriteBatch) -> Result<()>) -> Result<()> {
        let mut batch = WriteBatch::new();
        f(&mut batch)?;
        self.write_batch(batch)
    }

    /// Commit an already built write batch
    pub fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        let _write_guard = self.lock_writes()?;
        self.ensure_open()?;
        self.commit_locked(batch)
    }

    // =========================================================================
    // Key/Value Helpers
    // =========================================================================

    /// Get a value; a missing key is `LexiError::KeyNotFound`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.view(|txn| txn.get(key))
    }

    /// Whether a live value exists; a missing key is `Ok(false)`
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.view(|txn| txn.exists(key))
    }

    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.update(|txn| {
            txn.set(key, value);
            Ok(())
        })
    }

    /// Set a value that stops being visible after `ttl`
    pub fn set_with_ttl(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<()> {
        self.update(|txn| {
            txn.set_with_ttl(key, value, ttl);
            Ok(())
        })
    }

    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.update(|txn| {
            txn.delete(key);
            Ok(())
        })
    }

    /// Encode `value` with the crate codec and store it
    pub fn set_typed<T: Serialize + ?Sized>(&self, key: &[u8], value: &T) -> Result<()> {
        let bytes = codec::encode(value)?;
        self.set(key, &bytes)
    }

    /// Load and decode a value stored with `set_typed`
    pub fn get_typed<T: DeserializeOwned>(&self, key: &[u8]) -> Result<T> {
        codec::decode(&self.get(key)?)
    }

    /// All live keys, optionally restricted to a prefix, in sorted order
    pub fn keys(&self, prefix: Option<&[u8]>) -> Result<Vec<Vec<u8>>> {
        let opts = IterOptions::keys_only().with_prefix(prefix.unwrap_or_default());
        self.view(|txn| Ok(txn.iter(opts)?.map(|item| item.into_parts().0).collect()))
    }

    // =========================================================================
    // Backup / Restore
    // =========================================================================

    /// Write every live record to `path`, returning how many were written
    pub fn backup(&self, path: &Path) -> Result<u64> {
        self.ensure_open()?;
        backup::write_backup(self, path)
    }

    /// Load a backup file written by `backup`, returning how many records
    /// were applied
    ///
    /// The file is fully decoded before anything is written, so a damaged
    /// file leaves the store unchanged. Records are then committed
    /// `restore_batch_size` at a time; a failed commit keeps the batches
    /// before it.
    pub fn restore(&self, path: &Path) -> Result<u64> {
        self.ensure_open()?;
        backup::read_backup(self, path, self.config.restore_batch_size)
    }

    /// Restore on a background thread, reporting the outcome to `on_done`
    pub fn restore_async<F>(self: &Arc<Self>, path: impl Into<PathBuf>, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<u64>) + Send + 'static,
    {
        let engine = Arc::clone(self);
        let path = path.into();
        thread::spawn(move || {
            let result = engine.restore(&path);
            if let Err(e) = &result {
                tracing::warn!("Restore from {} failed: {}", path.display(), e);
            }
            on_done(result);
        })
    }

    // =========================================================================
    // Maintenance / Lifecycle
    // =========================================================================

    /// Run one maintenance pass
    ///
    /// Rewrites the SSTable set if at least `reclaim_ratio` of its records
    /// are shadowed, deleted, or expired.
    pub fn run_maintenance(&self, reclaim_ratio: f64) -> Result<MaintenanceOutcome> {
        if !(reclaim_ratio > 0.0 && reclaim_ratio <= 1.0) {
            return Err(LexiError::Config(format!(
                "reclaim_ratio must be in (0, 1], got {}",
                reclaim_ratio
            )));
        }

        let _write_guard = self.lock_writes()?;
        self.ensure_open()?;

        let outcome = self.storage.compact(reclaim_ratio, now_millis())?;
        tracing::debug!("Maintenance pass: {:?}", outcome);
        Ok(outcome)
    }

    /// Flush memtable to disk
    ///
    /// Forces a flush regardless of memtable size
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.lock_writes()?;
        self.ensure_open()?;
        self.flush_internal()
    }

    /// Close the engine: flush pending data and sync the WAL
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let _write_guard = self.lock_writes()?;
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.flush_internal()?;
        self.lock_wal()?.sync()?;

        tracing::debug!("Engine closed at {}", self.config.data_dir.display());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(LexiError::Closed);
        }
        Ok(())
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| LexiError::LockPoisoned(format!("Write lock poisoned: {}", e)))
    }

    fn lock_wal(&self) -> Result<MutexGuard<'_, WalWriter>> {
        self.wal
            .lock()
            .map_err(|e| LexiError::LockPoisoned(format!("WAL lock poisoned: {}", e)))
    }

    /// Commit a batch (called with write lock held)
    ///
    /// Steps:
    /// 1. Log the whole batch as one WAL record
    /// 2. Apply to MemTable
    /// 3. Flush if the MemTable grew past its limit
    fn commit_locked(&self, mut batch: WriteBatch) -> Result<()> {
        let mut ops = batch.take_ops();
        if ops.is_empty() {
            return Ok(());
        }

        let operation = if ops.len() == 1 {
            ops.remove(0)
        } else {
            Operation::Batch { ops }
        };

        self.lock_wal()?.append(operation.clone())?;
        Self::apply(&self.memtable, operation);
        self.commits.fetch_add(1, Ordering::SeqCst);

        if self.memtable.should_flush(self.config.memtable_size_limit) {
            self.flush_internal()?;
        }

        Ok(())
    }

    fn apply(memtable: &MemTable, operation: Operation) {
        match operation {
            Operation::Put {
                key,
                value,
                expires_at,
            } => {
                memtable.put_with_expiry(key, value, expires_at);
            }
            Operation::Delete { key } => {
                memtable.delete(key);
            }
            Operation::Batch { ops } => {
                for op in ops {
                    Self::apply(memtable, op);
                }
            }
        }
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        self.storage.flush(&self.memtable)?;
        self.memtable.clear();

        // Entries are now durable in an SSTable
        self.lock_wal()?.truncate()?;

        Ok(())
    }

    /// Newest live value for a key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    pub(crate) fn read_live(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let now = now_millis();

        if let Some(entry) = self.memtable.get(key) {
            return Ok(entry.live_value(now).map(<[u8]>::to_vec));
        }

        Ok(self
            .storage
            .get(key)?
            .and_then(|entry| entry.live_value(now).map(<[u8]>::to_vec)))
    }

    /// Live key/value pairs under a prefix, newest version per key
    ///
    /// The memtable is read before the SSTables, as in `read_live`: a flush
    /// adds its table before clearing the memtable, so records moving
    /// between the two are seen in at least one of them.
    pub(crate) fn scan_live(&self, prefix: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        let now = now_millis();

        let mut merged: BTreeMap<_, _> = self.memtable.scan_prefix(prefix).into_iter().collect();
        for (key, entry) in self.storage.scan_prefix(prefix)? {
            merged.entry(key).or_insert(entry);
        }

        Ok(merged
            .into_iter()
            .filter_map(|(key, entry)| entry.live_value(now).map(|v| (key, v.to_vec())))
            .collect())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the storage directory path (where SSTables are stored)
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Write transactions committed since open (empty ones excluded)
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
