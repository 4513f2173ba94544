//! MemTable Tests
//!
//! Tests verify:
//! - Basic put/get/remove operations
//! - Size tracking
//! - Sorted iteration
//! - Clear functionality
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use rowkv::memtable::MemTable;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.len(), 0);
    assert_eq!(memtable.size(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_put_and_get() {
    let memtable = MemTable::new();

    memtable.put(b"key1".to_vec(), b"value1".to_vec());

    assert_eq!(memtable.get(b"key1"), Some(b"value1".to_vec()));
    assert_eq!(memtable.get(b"nonexistent"), None);
}

#[test]
fn test_remove() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), b"value".to_vec());

    assert_eq!(memtable.remove(b"key"), 0);
    assert_eq!(memtable.remove(b"missing"), 0);
    assert_eq!(memtable.get(b"key"), None);
    assert!(memtable.is_empty());
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_tracks_keys_and_values() {
    let memtable = MemTable::new();

    assert_eq!(memtable.put(b"abc".to_vec(), b"12345".to_vec()), 8);
    assert_eq!(memtable.put(b"d".to_vec(), b"6".to_vec()), 10);
    assert_eq!(memtable.size(), 10);
}

#[test]
fn test_overwrite_adjusts_size() {
    let memtable = MemTable::new();

    memtable.put(b"key".to_vec(), b"long_value".to_vec());
    let size = memtable.put(b"key".to_vec(), b"v".to_vec());

    assert_eq!(size, 4);
    assert_eq!(memtable.len(), 1);
}

// =============================================================================
// Iteration / Clear Tests
// =============================================================================

#[test]
fn test_iter_is_sorted() {
    let memtable = MemTable::new();
    memtable.put(b"c".to_vec(), b"3".to_vec());
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.put(b"b".to_vec(), b"2".to_vec());

    let keys: Vec<Vec<u8>> = memtable.iter().map(|(k, _)| k).collect();

    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_clear() {
    let memtable = MemTable::default();
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.put(b"b".to_vec(), b"2".to_vec());

    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_and_writer() {
    let memtable = Arc::new(MemTable::new());
    memtable.put(b"shared".to_vec(), b"value".to_vec());

    let writer = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for i in 0..100u32 {
                memtable.put(i.to_be_bytes().to_vec(), b"x".to_vec());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let memtable = Arc::clone(&memtable);
            thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(memtable.get(b"shared"), Some(b"value".to_vec()));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(memtable.len(), 101);
}
