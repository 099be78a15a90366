//! # LexiKV
//!
//! An embedded key-value engine with a trie-indexed word dictionary on top:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery with partial write handling
//! - Closure-scoped transactions, TTLs, backup/restore
//! - Background maintenance with a bounded, acknowledged shutdown
//! - A dictionary cache that learns new vocabulary from free text
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DictionaryCache                          │
//! │             (TrieIndex + Tokenizer, single writer)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   LifecycleManager                           │
//! │          (maintenance ticks, shutdown handshake)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                                │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  (SSTable)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod codec;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod txn;
mod backup;
pub mod engine;
pub mod lifecycle;

pub mod dictionary;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LexiError, Result};
pub use config::{Config, WalSyncStrategy};
pub use engine::Engine;
pub use lifecycle::{LifecycleManager, LifecycleState, Maintainable};
pub use storage::MaintenanceOutcome;
pub use txn::{IterOptions, KvItem, ReadTxn, WriteBatch, WriteTxn};
pub use dictionary::{DictEntry, DictionaryCache, Segmenter, Tokenizer, TrieIndex};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of LexiKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
