//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Track size for flush triggers
//! - Ordered iteration for SSTable creation and prefix scans
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in a parking_lot RwLock: keys stay ordered, which is
//! what both SSTable generation and prefix scans need.

mod table;

pub use table::MemTable;

/// Entry stored in the MemTable
#[derive(Debug, Clone, PartialEq)]
pub enum MemTableEntry {
    /// A live value, optionally expiring at a unix-millis deadline
    Value {
        data: Vec<u8>,
        expires_at: Option<u64>,
    },

    /// A tombstone (deleted key)
    Tombstone,
}

impl MemTableEntry {
    /// Live value without expiry
    pub fn value(data: impl Into<Vec<u8>>) -> Self {
        MemTableEntry::Value {
            data: data.into(),
            expires_at: None,
        }
    }

    /// The value if this entry is live at `now` (unix millis)
    pub fn live_value(&self, now: u64) -> Option<&[u8]> {
        match self {
            MemTableEntry::Value { data, expires_at } => match expires_at {
                Some(deadline) if *deadline <= now => None,
                _ => Some(data.as_slice()),
            },
            MemTableEntry::Tombstone => None,
        }
    }

    fn footprint(&self) -> usize {
        match self {
            MemTableEntry::Value { data, .. } => data.len(),
            MemTableEntry::Tombstone => 0,
        }
    }
}
