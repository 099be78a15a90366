//! Tests for WAL entry framing
//!
//! These tests verify:
//! - Round trips for every operation shape, including expiring puts
//! - CRC corruption detection
//! - Truncated and malformed frames

use lexikv::wal::{Operation, WalEntry, HEADER_SIZE};
use lexikv::LexiError;

// =============================================================================
// Framing
// =============================================================================

#[test]
fn test_put_round_trip() {
    let entry = WalEntry::new(1, Operation::put("北京", b"entry".to_vec()));

    let bytes = entry.serialize().unwrap();
    let recovered = WalEntry::deserialize(&bytes).unwrap();

    assert_eq!(entry, recovered);
}

#[test]
fn test_expiring_put_keeps_deadline() {
    let entry = WalEntry::new(
        7,
        Operation::Put {
            key: b"session".to_vec(),
            value: b"token".to_vec(),
            expires_at: Some(1_700_000_000_000),
        },
    );

    let recovered = WalEntry::deserialize(&entry.serialize().unwrap()).unwrap();

    match recovered.operation {
        Operation::Put { expires_at, .. } => assert_eq!(expires_at, Some(1_700_000_000_000)),
        other => panic!("expected put, got {:?}", other),
    }
}

#[test]
fn test_batch_round_trip() {
    let entry = WalEntry::new(
        3,
        Operation::Batch {
            ops: vec![Operation::put("a", "1"), Operation::delete("b"), Operation::put("c", "")],
        },
    );

    let recovered = WalEntry::deserialize(&entry.serialize().unwrap()).unwrap();
    assert_eq!(entry, recovered);
}

#[test]
fn test_header_layout() {
    let entry = WalEntry::new(0x0102_0304, Operation::delete("key"));
    let bytes = entry.serialize().unwrap();

    assert_eq!(bytes.len(), entry.serialized_size().unwrap());
    assert_eq!(&bytes[0..8], &0x0102_0304u64.to_le_bytes());
    assert_eq!(&bytes[8..12], &entry.compute_crc().unwrap().to_le_bytes());

    let len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
    assert_eq!(len, bytes.len() - HEADER_SIZE);
}

// =============================================================================
// Corruption Detection
// =============================================================================

#[test]
fn test_payload_flip_detected() {
    let entry = WalEntry::new(5, Operation::put("key", "value"));
    let mut bytes = entry.serialize().unwrap();

    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    assert!(matches!(
        WalEntry::deserialize(&bytes),
        Err(LexiError::WalCorruption(_))
    ));
}

#[test]
fn test_lsn_flip_detected() {
    let entry = WalEntry::new(5, Operation::put("key", "value"));
    let mut bytes = entry.serialize().unwrap();

    // The CRC covers the LSN as well
    bytes[0] ^= 0x01;

    assert!(matches!(
        WalEntry::deserialize(&bytes),
        Err(LexiError::WalCorruption(_))
    ));
}

#[test]
fn test_short_header_rejected() {
    assert!(matches!(
        WalEntry::deserialize(&[0u8; HEADER_SIZE - 1]),
        Err(LexiError::WalCorruption(_))
    ));
}

#[test]
fn test_truncated_body_rejected() {
    let bytes = WalEntry::new(9, Operation::put("key", "value"))
        .serialize()
        .unwrap();

    assert!(matches!(
        WalEntry::deserialize(&bytes[..bytes.len() - 2]),
        Err(LexiError::WalCorruption(_))
    ));
}

#[test]
fn test_large_value() {
    let value = vec![0xAB; 1024 * 1024];
    let entry = WalEntry::new(11, Operation::put("big", value));

    let recovered = WalEntry::deserialize(&entry.serialize().unwrap()).unwrap();
    assert_eq!(entry, recovered);
}
