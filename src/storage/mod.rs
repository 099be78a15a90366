//! Storage Module
//!
//! Persistent storage layer using SSTable-like format.
//!
//! ## Responsibilities
//! - Persist data to disk in sorted format
//! - Point lookups and prefix scans across all tables
//! - Maintenance passes that merge tables and drop garbage
//!   (shadowed versions, tombstones, expired values)

mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
pub use manager::{MaintenanceOutcome, StorageManager};
