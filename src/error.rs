//! Error types for LexiKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LexiError
pub type Result<T> = std::result::Result<T, LexiError>;

/// Unified error type for LexiKV operations
#[derive(Debug, Error)]
pub enum LexiError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Dictionary Errors
    // -------------------------------------------------------------------------
    #[error("Dictionary bootstrap failed: {source}")]
    Bootstrap {
        #[source]
        source: Box<LexiError>,
    },

    #[error("Invalid dictionary entry: {0}")]
    InvalidEntry(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Engine is closed")]
    Closed,

    #[error("Engine close timed out")]
    CloseTimedOut,

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<bincode::Error> for LexiError {
    fn from(e: bincode::Error) -> Self {
        LexiError::Serialization(e.to_string())
    }
}

impl LexiError {
    /// Wrap an error raised while rebuilding the dictionary from storage
    pub fn bootstrap(source: LexiError) -> Self {
        LexiError::Bootstrap {
            source: Box::new(source),
        }
    }
}
