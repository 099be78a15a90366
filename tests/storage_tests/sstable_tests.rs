//! SSTable Tests
//!
//! Tests verify:
//! - Builder ordering rules and metadata
//! - Point lookups, tombstones and expiry deadlines
//! - Prefix scans
//! - Rejection of damaged files

use std::fs;

use lexikv::memtable::MemTableEntry;
use lexikv::storage::{SSTableBuilder, SSTableReader};
use lexikv::LexiError;
use tempfile::TempDir;

fn build(dir: &TempDir, entries: &[(&str, Option<&str>)]) -> std::path::PathBuf {
    let path = dir.path().join("table.sst");
    let mut builder = SSTableBuilder::new(&path).unwrap();
    for (key, value) in entries {
        match value {
            Some(v) => builder.add(key.as_bytes(), v.as_bytes()).unwrap(),
            None => builder.add_tombstone(key.as_bytes()).unwrap(),
        }
    }
    builder.finish().unwrap();
    path
}

// =============================================================================
// Builder
// =============================================================================

#[test]
fn test_finish_reports_metadata() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("table.sst");

    let mut builder = SSTableBuilder::new(&path).unwrap();
    builder.add(b"apple", b"1").unwrap();
    builder.add_tombstone(b"banana").unwrap();
    builder.add(b"cherry", b"3").unwrap();
    let table = builder.finish().unwrap();

    assert_eq!(table.entry_count(), 3);
    assert_eq!(table.min_key, b"apple".to_vec());
    assert_eq!(table.max_key, b"cherry".to_vec());
    assert_eq!(table.file_size, fs::metadata(&path).unwrap().len());
    assert!(table.might_contain(b"blueberry"));
    assert!(!table.might_contain(b"zucchini"));
}

#[test]
fn test_out_of_order_keys_rejected() {
    let dir = TempDir::new().unwrap();
    let mut builder = SSTableBuilder::new(&dir.path().join("table.sst")).unwrap();

    builder.add(b"b", b"1").unwrap();
    assert!(matches!(builder.add(b"a", b"2"), Err(LexiError::Storage(_))));
    assert!(matches!(builder.add(b"b", b"3"), Err(LexiError::Storage(_))));
}

// =============================================================================
// Reader
// =============================================================================

#[test]
fn test_point_lookups() {
    let dir = TempDir::new().unwrap();
    let path = build(&dir, &[("a", Some("1")), ("b", None), ("c", Some(""))]);

    let reader = SSTableReader::open(&path).unwrap();

    assert_eq!(reader.entry_count(), 3);
    assert_eq!(reader.get(b"a").unwrap(), Some(MemTableEntry::value("1")));
    assert_eq!(reader.get(b"b").unwrap(), Some(MemTableEntry::Tombstone));
    assert_eq!(reader.get(b"c").unwrap(), Some(MemTableEntry::value("")));
    assert_eq!(reader.get(b"d").unwrap(), None);
}

#[test]
fn test_expiry_deadline_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("table.sst");

    let mut builder = SSTableBuilder::new(&path).unwrap();
    builder.add_expiring(b"session", b"token", Some(42_000)).unwrap();
    builder.finish().unwrap();

    let reader = SSTableReader::open(&path).unwrap();
    assert_eq!(
        reader.get(b"session").unwrap(),
        Some(MemTableEntry::Value {
            data: b"token".to_vec(),
            expires_at: Some(42_000),
        })
    );
}

#[test]
fn test_entries_in_key_order() {
    let dir = TempDir::new().unwrap();
    let path = build(&dir, &[("a", Some("1")), ("b", Some("2")), ("c", None)]);

    let reader = SSTableReader::open(&path).unwrap();
    let keys: Vec<Vec<u8>> = reader.entries().unwrap().into_iter().map(|(k, _)| k).collect();

    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    assert_eq!(reader.min_key(), Some(&b"a"[..]));
    assert_eq!(reader.max_key(), Some(&b"c"[..]));
}

#[test]
fn test_scan_prefix() {
    let dir = TempDir::new().unwrap();
    let path = build(
        &dir,
        &[
            ("上海", Some("1")),
            ("北京", Some("2")),
            ("北京大学", Some("3")),
            ("北海", None),
            ("南京", Some("4")),
        ],
    );
    let reader = SSTableReader::open(&path).unwrap();

    let hits = reader.scan_prefix("北".as_bytes()).unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|(k, _)| k.starts_with("北".as_bytes())));

    assert!(reader.scan_prefix(b"zzz").unwrap().is_empty());
}

// =============================================================================
// Damaged Files
// =============================================================================

#[test]
fn test_bad_magic_rejected() {
    let dir = TempDir::new().unwrap();
    let path = build(&dir, &[("a", Some("1"))]);

    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(SSTableReader::open(&path), Err(LexiError::Storage(_))));
}

#[test]
fn test_data_corruption_rejected() {
    let dir = TempDir::new().unwrap();
    let path = build(&dir, &[("key", Some("value"))]);

    let mut bytes = fs::read(&path).unwrap();
    // First byte of the entry's key, right after the 14-byte header and
    // the 16-byte entry header
    bytes[30] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(SSTableReader::open(&path), Err(LexiError::Storage(_))));
}

#[test]
fn test_too_small_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("table.sst");
    fs::write(&path, b"LXKV").unwrap();

    assert!(matches!(SSTableReader::open(&path), Err(LexiError::Storage(_))));
}
