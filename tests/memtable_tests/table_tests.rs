//! MemTable Tests
//!
//! Tests verify:
//! - Basic CRUD operations and tombstones
//! - Expiry visibility
//! - Size tracking
//! - Sorted iteration and prefix scans
//! - Concurrent readers alongside a writer

use std::sync::Arc;
use std::thread;

use lexikv::memtable::{MemTable, MemTableEntry};

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
    assert_eq!(memtable.entry_count(), 0);
}

#[test]
fn test_put_get_overwrite() {
    let memtable = MemTable::new();

    memtable.put(b"key".to_vec(), b"first".to_vec());
    memtable.put(b"key".to_vec(), b"second".to_vec());

    assert_eq!(memtable.get(b"key"), Some(MemTableEntry::value("second")));
    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get(b"missing"), None);
}

#[test]
fn test_delete_leaves_tombstone() {
    let memtable = MemTable::new();

    memtable.put(b"key".to_vec(), b"value".to_vec());
    memtable.delete(b"key".to_vec());

    assert_eq!(memtable.get(b"key"), Some(MemTableEntry::Tombstone));
    assert_eq!(memtable.entry_count(), 1);
}

// =============================================================================
// Expiry
// =============================================================================

#[test]
fn test_live_value_respects_deadline() {
    let memtable = MemTable::new();
    memtable.put_with_expiry(b"session".to_vec(), b"token".to_vec(), Some(1_000));

    let entry = memtable.get(b"session").unwrap();
    assert_eq!(entry.live_value(999), Some(&b"token"[..]));
    assert_eq!(entry.live_value(1_000), None);
}

#[test]
fn test_no_deadline_never_expires() {
    let entry = MemTableEntry::value("v");
    assert_eq!(entry.live_value(u64::MAX), Some(&b"v"[..]));
    assert_eq!(MemTableEntry::Tombstone.live_value(0), None);
}

// =============================================================================
// Size Tracking
// =============================================================================

#[test]
fn test_size_counts_keys_and_values() {
    let memtable = MemTable::new();

    assert_eq!(memtable.put(b"abc".to_vec(), b"12345".to_vec()), 8);
    // Same key: only the value delta changes the size
    assert_eq!(memtable.put(b"abc".to_vec(), b"12".to_vec()), 5);
    // Tombstone drops the value bytes, the key stays
    assert_eq!(memtable.delete(b"abc".to_vec()), 3);
    assert_eq!(memtable.size(), 3);
}

#[test]
fn test_should_flush() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), vec![0u8; 97]);

    assert!(memtable.should_flush(100));
    assert!(!memtable.should_flush(101));
}

#[test]
fn test_clear() {
    let memtable = MemTable::new();
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.delete(b"b".to_vec());

    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_iter_sorted() {
    let memtable = MemTable::new();
    for key in ["c", "a", "b"] {
        memtable.put(key.as_bytes().to_vec(), b"v".to_vec());
    }

    let keys: Vec<Vec<u8>> = memtable.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_scan_prefix() {
    let memtable = MemTable::new();
    for key in ["北京", "北京大学", "北海", "上海", "南京"] {
        memtable.put(key.as_bytes().to_vec(), b"v".to_vec());
    }
    memtable.delete("北方".as_bytes().to_vec());

    let keys: Vec<String> = memtable
        .scan_prefix("北".as_bytes())
        .into_iter()
        .map(|(k, _)| String::from_utf8(k).unwrap())
        .collect();

    assert_eq!(keys.len(), 4);
    assert!(keys.iter().all(|k| k.starts_with('北')));
    assert!(keys.contains(&"北方".to_string()));
}

#[test]
fn test_scan_empty_prefix_returns_all() {
    let memtable = MemTable::new();
    memtable.put(b"x".to_vec(), b"1".to_vec());
    memtable.put(b"y".to_vec(), b"2".to_vec());

    assert_eq!(memtable.scan_prefix(b"").len(), 2);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_readers_with_writer() {
    let memtable = Arc::new(MemTable::new());

    let writer = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for i in 0..1000u32 {
                memtable.put(i.to_be_bytes().to_vec(), b"v".to_vec());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let memtable = Arc::clone(&memtable);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    let _ = memtable.get(&i.to_be_bytes());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 1000);
}
