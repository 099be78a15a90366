//! StorageManager Tests
//!
//! Tests verify:
//! - Flush and discovery across reopen
//! - Newest-wins lookups over several tables
//! - Prefix scans merged across tables
//! - Compaction thresholds and what compaction drops

use lexikv::memtable::{MemTable, MemTableEntry};
use lexikv::storage::{MaintenanceOutcome, StorageManager};
use tempfile::TempDir;

fn memtable(entries: &[(&str, Option<&str>)]) -> MemTable {
    let memtable = MemTable::new();
    for (key, value) in entries {
        match value {
            Some(v) => memtable.put(key.as_bytes().to_vec(), v.as_bytes().to_vec()),
            None => memtable.delete(key.as_bytes().to_vec()),
        };
    }
    memtable
}

// =============================================================================
// Flush / Open
// =============================================================================

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    assert_eq!(storage.sstable_count(), 0);
    assert_eq!(storage.next_sstable_id(), 1);
    assert_eq!(storage.get(b"anything").unwrap(), None);
}

#[test]
fn test_flush_empty_memtable_fails() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    assert!(storage.flush(&MemTable::new()).is_err());
}

#[test]
fn test_flush_then_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let storage = StorageManager::open(dir.path()).unwrap();
        storage.flush(&memtable(&[("a", Some("1")), ("b", Some("2"))])).unwrap();
        storage.flush(&memtable(&[("c", Some("3"))])).unwrap();
        assert_eq!(storage.sstable_count(), 2);
    }

    let storage = StorageManager::open(dir.path()).unwrap();
    assert_eq!(storage.sstable_count(), 2);
    assert_eq!(storage.total_entries(), 3);
    assert_eq!(storage.next_sstable_id(), 3);
    assert_eq!(storage.get(b"c").unwrap(), Some(MemTableEntry::value("3")));
}

#[test]
fn test_foreign_files_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
    std::fs::write(dir.path().join("sstable_abc.sst"), b"junk").unwrap();

    let storage = StorageManager::open(dir.path()).unwrap();
    assert_eq!(storage.sstable_count(), 0);
}

// =============================================================================
// Reads
// =============================================================================

#[test]
fn test_newest_table_wins() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    storage.flush(&memtable(&[("k", Some("old")), ("gone", Some("x"))])).unwrap();
    storage.flush(&memtable(&[("k", Some("new")), ("gone", None)])).unwrap();

    assert_eq!(storage.get(b"k").unwrap(), Some(MemTableEntry::value("new")));
    assert_eq!(storage.get(b"gone").unwrap(), Some(MemTableEntry::Tombstone));
}

#[test]
fn test_scan_prefix_merges_tables() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    storage
        .flush(&memtable(&[("北京", Some("old")), ("北海", Some("1")), ("上海", Some("2"))]))
        .unwrap();
    storage
        .flush(&memtable(&[("北京", Some("new")), ("北海", None)]))
        .unwrap();

    let merged = storage.scan_prefix("北".as_bytes()).unwrap();

    assert_eq!(merged.len(), 2);
    assert_eq!(merged["北京".as_bytes()], MemTableEntry::value("new"));
    assert_eq!(merged["北海".as_bytes()], MemTableEntry::Tombstone);
}

// =============================================================================
// Compaction
// =============================================================================

#[test]
fn test_compact_skips_below_ratio() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    storage
        .flush(&memtable(&[("a", Some("1")), ("b", Some("2")), ("c", Some("3")), ("d", None)]))
        .unwrap();

    // 1 of 4 records is garbage
    match storage.compact(0.5, 0).unwrap() {
        MaintenanceOutcome::Skipped { reclaimable } => assert!((reclaimable - 0.25).abs() < 1e-9),
        other => panic!("expected skip, got {:?}", other),
    }
    assert_eq!(storage.sstable_count(), 1);
}

#[test]
fn test_compact_merges_and_drops_garbage() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    storage.flush(&memtable(&[("a", Some("1")), ("b", Some("2"))])).unwrap();
    storage.flush(&memtable(&[("a", Some("3")), ("b", None)])).unwrap();

    let outcome = storage.compact(0.5, 0).unwrap();

    match outcome {
        MaintenanceOutcome::Compacted {
            tables_merged,
            entries_dropped,
            ..
        } => {
            assert_eq!(tables_merged, 2);
            assert_eq!(entries_dropped, 3);
        }
        other => panic!("expected compaction, got {:?}", other),
    }

    assert_eq!(storage.sstable_count(), 1);
    assert_eq!(storage.total_entries(), 1);
    assert_eq!(storage.get(b"a").unwrap(), Some(MemTableEntry::value("3")));
    assert_eq!(storage.get(b"b").unwrap(), None);

    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 1);
}

#[test]
fn test_compact_drops_expired_values() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    let table = MemTable::new();
    table.put_with_expiry(b"session".to_vec(), b"token".to_vec(), Some(1_000));
    storage.flush(&table).unwrap();

    assert_eq!(
        storage.compact(1.0, 500).unwrap(),
        MaintenanceOutcome::Skipped { reclaimable: 0.0 }
    );

    let outcome = storage.compact(1.0, 2_000).unwrap();
    assert!(matches!(outcome, MaintenanceOutcome::Compacted { tables_merged: 1, .. }));
    assert_eq!(storage.sstable_count(), 0);
    assert_eq!(storage.get(b"session").unwrap(), None);
}

#[test]
fn test_compact_empty_storage() {
    let dir = TempDir::new().unwrap();
    let storage = StorageManager::open(dir.path()).unwrap();

    assert_eq!(
        storage.compact(0.1, 0).unwrap(),
        MaintenanceOutcome::Skipped { reclaimable: 0.0 }
    );
}
