//! Transactions
//!
//! Closure-scoped read and write transactions over an [`Engine`], plus the
//! write batch and key iterator they hand out.
//!
//! - `Engine::view` runs a closure against a [`ReadTxn`]
//! - `Engine::update` runs a closure against a [`WriteTxn`]; its writes are
//!   buffered and committed as one WAL record only if the closure returns `Ok`
//! - Write transactions hold the engine's write lock for their whole
//!   duration, so they are serializable

use std::collections::BTreeMap;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{LexiError, Result};
use crate::wal::{expiry_after, Operation};

// =============================================================================
// Iteration
// =============================================================================

/// Options for [`ReadTxn::iter`]
#[derive(Debug, Clone)]
pub struct IterOptions {
    /// Carry values along with keys
    pub prefetch_values: bool,
    /// Only yield keys starting with this prefix (empty = all keys)
    pub prefix: Vec<u8>,
}

impl Default for IterOptions {
    fn default() -> Self {
        Self {
            prefetch_values: true,
            prefix: Vec::new(),
        }
    }
}

impl IterOptions {
    /// Keys only, no values
    pub fn keys_only() -> Self {
        Self {
            prefetch_values: false,
            prefix: Vec::new(),
        }
    }

    /// Restrict iteration to a key prefix
    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// One key (and, if prefetched, its value)
#[derive(Debug, Clone, PartialEq)]
pub struct KvItem {
    key: Vec<u8>,
    value: Option<Vec<u8>>,
}

impl KvItem {
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The value, or `None` when the iterator was opened keys-only
    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn into_parts(self) -> (Vec<u8>, Option<Vec<u8>>) {
        (self.key, self.value)
    }
}

/// Iterator over live keys in sorted order
///
/// The key set is captured when the iterator is created.
pub struct TxnIterator {
    items: std::vec::IntoIter<KvItem>,
}

impl TxnIterator {
    fn new(live: BTreeMap<Vec<u8>, Vec<u8>>, prefetch_values: bool) -> Self {
        let items: Vec<KvItem> = live
            .into_iter()
            .map(|(key, value)| KvItem {
                key,
                value: prefetch_values.then_some(value),
            })
            .collect();
        Self {
            items: items.into_iter(),
        }
    }
}

impl Iterator for TxnIterator {
    type Item = KvItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

// =============================================================================
// Read Transaction
// =============================================================================

/// Read-only view of the engine
pub struct ReadTxn<'a> {
    engine: &'a Engine,
}

impl<'a> ReadTxn<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    /// Get a value; a missing or expired key is `KeyNotFound`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.engine.read_live(key)?.ok_or(LexiError::KeyNotFound)
    }

    /// Whether a live value exists for the key
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.engine.read_live(key)?.is_some())
    }

    /// Iterate live keys in sorted order
    pub fn iter(&self, opts: IterOptions) -> Result<TxnIterator> {
        let live = self.engine.scan_live(&opts.prefix)?;
        Ok(TxnIterator::new(live, opts.prefetch_values))
    }
}

// =============================================================================
// Write Batch
// =============================================================================

/// Writes applied together as one atomic WAL record
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<Operation>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(Operation::put(key, value));
    }

    /// Set a value that disappears after `ttl`
    pub fn set_with_ttl(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, ttl: Duration) {
        self.ops.push(Operation::Put {
            key: key.into(),
            value: value.into(),
            expires_at: Some(expiry_after(ttl)),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(Operation::delete(key));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn take_ops(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.ops)
    }
}

// =============================================================================
// Write Transaction
// =============================================================================

/// Read-write transaction; reads see the transaction's own pending writes
pub struct WriteTxn<'a> {
    read: ReadTxn<'a>,
    batch: WriteBatch,
    /// Pending state per key: `Some(value)` = set, `None` = deleted
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Self {
            read: ReadTxn::new(engine),
            batch: WriteBatch::new(),
            pending: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        match self.pending.get(key) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(LexiError::KeyNotFound),
            None => self.read.get(key),
        }
    }

    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        match self.pending.get(key) {
            Some(state) => Ok(state.is_some()),
            None => self.read.exists(key),
        }
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let (key, value) = (key.into(), value.into());
        self.pending.insert(key.clone(), Some(value.clone()));
        self.batch.set(key, value);
    }

    pub fn set_with_ttl(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, ttl: Duration) {
        let (key, value) = (key.into(), value.into());
        self.pending.insert(key.clone(), Some(value.clone()));
        self.batch.set_with_ttl(key, value, ttl);
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        let key = key.into();
        self.pending.insert(key.clone(), None);
        self.batch.delete(key);
    }

    /// Iterate live keys, pending writes included
    pub fn iter(&self, opts: IterOptions) -> Result<TxnIterator> {
        let mut live = self.read.engine.scan_live(&opts.prefix)?;
        for (key, state) in &self.pending {
            if !key.starts_with(&opts.prefix) {
                continue;
            }
            match state {
                Some(value) => {
                    live.insert(key.clone(), value.clone());
                }
                None => {
                    live.remove(key);
                }
            }
        }
        Ok(TxnIterator::new(live, opts.prefetch_values))
    }

    pub(crate) fn into_batch(self) -> WriteBatch {
        self.batch
    }
}
