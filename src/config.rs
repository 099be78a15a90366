//! Configuration for LexiKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LexiError, Result};

/// Main configuration for a LexiKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files (WAL, SSTables, etc.)
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.log          (write-ahead log)
    ///     └── sstables/        (SSTable files)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,

    // -------------------------------------------------------------------------
    // Lifecycle Configuration
    // -------------------------------------------------------------------------
    /// Time between two background maintenance passes
    pub maintenance_interval: Duration,

    /// Minimum reclaimable fraction of the SSTable set before a maintenance
    /// pass rewrites it (0.5 = at least half the stored records are garbage)
    pub reclaim_ratio: f64,

    /// How long `close()` waits for the background loop to acknowledge
    pub close_timeout: Duration,

    /// Writes applied per batch when restoring a backup
    pub restore_batch_size: usize,

    // -------------------------------------------------------------------------
    // Dictionary Configuration
    // -------------------------------------------------------------------------
    /// Frequency given to words picked up by `learn_from_text`
    pub learn_frequency: f64,

    /// Part-of-speech tag given to words picked up by `learn_from_text`
    pub learn_pos: String,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Tag for "other proper noun", used for learned words
pub const OTHER_PROPER_NOUN: &str = "nz";

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./lexikv_data"),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            memtable_size_limit: 64 * 1024 * 1024, // 64 MB
            maintenance_interval: Duration::from_secs(5 * 60),
            reclaim_ratio: 0.5,
            close_timeout: Duration::from_secs(5),
            restore_batch_size: 500,
            learn_frequency: 1000.0,
            learn_pos: OTHER_PROPER_NOUN.to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.reclaim_ratio > 0.0 && self.reclaim_ratio <= 1.0) {
            return Err(LexiError::Config(format!(
                "reclaim_ratio must be in (0, 1], got {}",
                self.reclaim_ratio
            )));
        }
        if self.maintenance_interval.is_zero() {
            return Err(LexiError::Config(
                "maintenance_interval must be non-zero".to_string(),
            ));
        }
        if self.close_timeout.is_zero() {
            return Err(LexiError::Config("close_timeout must be non-zero".to_string()));
        }
        if self.restore_batch_size == 0 {
            return Err(LexiError::Config(
                "restore_batch_size must be non-zero".to_string(),
            ));
        }
        if !(self.learn_frequency.is_finite() && self.learn_frequency > 0.0) {
            return Err(LexiError::Config(format!(
                "learn_frequency must be positive, got {}",
                self.learn_frequency
            )));
        }
        // Learned words are written out as `content frequency pos` lines
        if self.learn_pos.is_empty() || self.learn_pos.chars().any(char::is_whitespace) {
            return Err(LexiError::Config(format!(
                "learn_pos must be one non-empty token, got {:?}",
                self.learn_pos
            )));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(LexiError::Config(
                "EveryNEntries count must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.memtable_size_limit = size;
        self
    }

    /// Set the initial maintenance interval
    pub fn maintenance_interval(mut self, interval: Duration) -> Self {
        self.config.maintenance_interval = interval;
        self
    }

    /// Set the reclaim ratio used by background maintenance
    pub fn reclaim_ratio(mut self, ratio: f64) -> Self {
        self.config.reclaim_ratio = ratio;
        self
    }

    /// Set the shutdown acknowledgement timeout
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config.close_timeout = timeout;
        self
    }

    /// Set the restore batch size
    pub fn restore_batch_size(mut self, size: usize) -> Self {
        self.config.restore_batch_size = size;
        self
    }

    /// Set the frequency assigned to learned words
    pub fn learn_frequency(mut self, frequency: f64) -> Self {
        self.config.learn_frequency = frequency;
        self
    }

    /// Set the tag assigned to learned words
    pub fn learn_pos(mut self, pos: impl Into<String>) -> Self {
        self.config.learn_pos = pos.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step
    pub fn try_build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
