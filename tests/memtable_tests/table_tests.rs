//! MemTable Tests
//!
//! Tests verify:
//! - Basic insert/get/remove operations
//! - Size tracking
//! - Sorted iteration and value enumeration
//! - Clear functionality
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use eventease::memtable::MemTable;

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_put_and_get() {
    let memtable = MemTable::new();

    memtable.put("key1".to_string(), b"value1".to_vec());

    assert_eq!(memtable.get("key1"), Some(b"value1".to_vec()));
    assert!(memtable.contains_key("key1"));
}

#[test]
fn test_get_nonexistent_key() {
    let memtable = MemTable::new();

    assert_eq!(memtable.get("nonexistent"), None);
    assert!(!memtable.contains_key("nonexistent"));
}

#[test]
fn test_put_overwrites_existing() {
    let memtable = MemTable::new();

    memtable.put("key1".to_string(), b"value1".to_vec());
    memtable.put("key1".to_string(), b"value2".to_vec());

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get("key1"), Some(b"value2".to_vec()));
}

#[test]
fn test_remove_returns_prior_value() {
    let memtable = MemTable::new();

    memtable.put("key1".to_string(), b"value1".to_vec());
    let removed = memtable.remove("key1");

    assert_eq!(removed, Some(b"value1".to_vec()));
    assert_eq!(memtable.get("key1"), None);
    assert!(memtable.is_empty());
}

#[test]
fn test_remove_missing_key() {
    let memtable = MemTable::new();
    memtable.put("a".to_string(), b"1".to_vec());

    assert_eq!(memtable.remove("b"), None);
    assert_eq!(memtable.entry_count(), 1);
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_counts_keys_and_values() {
    let memtable = MemTable::new();

    let size = memtable.put("abc".to_string(), b"12345".to_vec());

    assert_eq!(size, 8);
    assert_eq!(memtable.size(), 8);
}

#[test]
fn test_size_after_overwrite() {
    let memtable = MemTable::new();

    memtable.put("abc".to_string(), b"12345".to_vec());
    memtable.put("abc".to_string(), b"1".to_vec());

    assert_eq!(memtable.size(), 4);
}

#[test]
fn test_size_after_remove() {
    let memtable = MemTable::new();

    memtable.put("abc".to_string(), b"12345".to_vec());
    memtable.put("de".to_string(), b"1".to_vec());
    memtable.remove("abc");

    assert_eq!(memtable.size(), 3);
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_iter_returns_sorted_keys() {
    let memtable = MemTable::new();

    memtable.put("charlie".to_string(), b"3".to_vec());
    memtable.put("alpha".to_string(), b"1".to_vec());
    memtable.put("bravo".to_string(), b"2".to_vec());

    let keys: Vec<String> = memtable.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["alpha", "bravo", "charlie"]);
}

#[test]
fn test_values_follow_key_order_not_insertion_order() {
    let memtable = MemTable::new();

    memtable.put("z".to_string(), b"last".to_vec());
    memtable.put("a".to_string(), b"first".to_vec());

    assert_eq!(memtable.values(), vec![b"first".to_vec(), b"last".to_vec()]);
}

#[test]
fn test_iter_is_a_snapshot() {
    let memtable = MemTable::new();
    memtable.put("a".to_string(), b"1".to_vec());

    let iter = memtable.iter();
    memtable.put("b".to_string(), b"2".to_vec());

    assert_eq!(iter.len(), 1);
}

#[test]
fn test_clear() {
    let memtable = MemTable::new();
    memtable.put("a".to_string(), b"1".to_vec());
    memtable.put("b".to_string(), b"2".to_vec());

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
    for i in 0..100 {
        memtable.put(format!("key{:03}", i), vec![i as u8]);
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let memtable = Arc::clone(&memtable);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                assert_eq!(memtable.get(&format!("key{:03}", i)), Some(vec![i as u8]));
            }
        }));
    }

    let writer = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for i in 100..200 {
                memtable.put(format!("key{:03}", i), vec![i as u8]);
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    writer.join().unwrap();

    assert_eq!(memtable.entry_count(), 200);
}
