//! Tests for DurableMap
//!
//! These tests verify:
//! - insert/get/values/remove contract
//! - Ascending key order of enumeration
//! - Restart durability (WAL replay, checkpoints, torn tails)
//! - Checkpoint triggering and WAL truncation
//! - Concurrent access patterns

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::thread;

use eventease::config::{Config, WalSyncStrategy};
use eventease::store::DurableMap;
use eventease::EventEaseError;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    name: String,
    qty: u32,
}

fn item(name: &str, qty: u32) -> Item {
    Item {
        name: name.to_string(),
        qty,
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(temp_dir: &TempDir, checkpoint_threshold: usize) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .checkpoint_threshold(checkpoint_threshold)
        .build()
}

fn setup_temp_store() -> (TempDir, DurableMap<Item>) {
    let temp_dir = TempDir::new().unwrap();
    let store = DurableMap::open(config_for(&temp_dir, 1000)).unwrap();
    (temp_dir, store)
}

fn reopen(temp_dir: &TempDir, checkpoint_threshold: usize) -> DurableMap<Item> {
    DurableMap::open(config_for(temp_dir, checkpoint_threshold)).unwrap()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_wal() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("tickets");

    let _store: DurableMap<Item> =
        DurableMap::open(Config::builder().data_dir(&data_dir).build()).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("wal.log").exists());
}

#[test]
fn test_open_path_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let store: DurableMap<Item> = DurableMap::open_path(temp_dir.path()).unwrap();
    store.insert("a", &item("apple", 3)).unwrap();

    assert_eq!(store.data_dir(), temp_dir.path());
    assert_eq!(store.config().checkpoint_threshold, Config::default().checkpoint_threshold);
    assert_eq!(store.get("a").unwrap(), Some(item("apple", 3)));
}

#[test]
fn test_insert_get() {
    let (_temp, store) = setup_temp_store();

    store.insert("a", &item("apple", 3)).unwrap();

    assert_eq!(store.get("a").unwrap(), Some(item("apple", 3)));
    assert!(store.contains_key("a"));
}

#[test]
fn test_get_missing_key() {
    let (_temp, store) = setup_temp_store();

    assert_eq!(store.get("missing").unwrap(), None);
}

#[test]
fn test_insert_overwrites() {
    let (_temp, store) = setup_temp_store();

    store.insert("a", &item("apple", 3)).unwrap();
    store.insert("a", &item("apricot", 4)).unwrap();

    assert_eq!(store.get("a").unwrap(), Some(item("apricot", 4)));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_returns_prior_value() {
    let (_temp, store) = setup_temp_store();

    store.insert("a", &item("apple", 3)).unwrap();

    assert_eq!(store.remove("a").unwrap(), Some(item("apple", 3)));
    assert_eq!(store.get("a").unwrap(), None);
    assert!(store.is_empty());
}

#[test]
fn test_remove_missing_key_has_no_side_effect() {
    let (_temp, store) = setup_temp_store();
    store.insert("a", &item("apple", 3)).unwrap();
    let pending = store.pending_wal_entries();

    assert_eq!(store.remove("zzz").unwrap(), None);

    assert_eq!(store.len(), 1);
    assert_eq!(store.pending_wal_entries(), pending);
}

#[test]
fn test_values_in_ascending_key_order() {
    let (_temp, store) = setup_temp_store();

    store.insert("c", &item("cherry", 1)).unwrap();
    store.insert("a", &item("apple", 2)).unwrap();
    store.insert("b", &item("banana", 3)).unwrap();

    let names: Vec<String> = store.values().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["apple", "banana", "cherry"]);
}

#[test]
fn test_values_of_empty_store() {
    let (_temp, store) = setup_temp_store();
    assert!(store.values().unwrap().is_empty());
}

#[test]
fn test_get_with_wrong_value_type_is_serialization_error() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store: DurableMap<String> = DurableMap::open(config_for(&temp_dir, 1000)).unwrap();
        store.insert("a", &"plain string".to_string()).unwrap();
    }

    let store: DurableMap<Item> = reopen(&temp_dir, 1000);
    assert!(matches!(store.get("a"), Err(EventEaseError::Serialization(_))));
}

// =============================================================================
// Durability Tests
// =============================================================================

#[test]
fn test_reopen_replays_wal() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = reopen(&temp_dir, 1000);
        store.insert("a", &item("apple", 1)).unwrap();
        store.insert("b", &item("banana", 2)).unwrap();
        store.insert("a", &item("apple", 5)).unwrap();
        store.remove("b").unwrap();
        // dropped without close: only the WAL holds these writes
    }

    let store = reopen(&temp_dir, 1000);

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("a").unwrap(), Some(item("apple", 5)));
    assert_eq!(store.get("b").unwrap(), None);
}

#[test]
fn test_reopen_folds_wal_into_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = reopen(&temp_dir, 1000);
        store.insert("a", &item("apple", 1)).unwrap();
    }

    let store = reopen(&temp_dir, 1000);

    assert!(store.snapshot_path().exists());
    assert_eq!(store.pending_wal_entries(), 0);
    assert_eq!(fs::metadata(temp_dir.path().join("wal.log")).unwrap().len(), 0);
}

#[test]
fn test_checkpoint_triggered_by_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let store = reopen(&temp_dir, 3);

    store.insert("a", &item("apple", 1)).unwrap();
    store.insert("b", &item("banana", 2)).unwrap();
    assert_eq!(store.pending_wal_entries(), 2);
    assert!(!store.snapshot_path().exists());

    store.insert("c", &item("cherry", 3)).unwrap();
    assert_eq!(store.pending_wal_entries(), 0);
    assert!(store.snapshot_path().exists());
}

#[test]
fn test_reopen_after_checkpoint_and_more_writes() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = reopen(&temp_dir, 1000);
        store.insert("a", &item("apple", 1)).unwrap();
        store.insert("b", &item("banana", 2)).unwrap();
        store.checkpoint().unwrap();

        store.remove("a").unwrap();
        store.insert("c", &item("cherry", 3)).unwrap();
    }

    let store = reopen(&temp_dir, 1000);

    let names: Vec<String> = store.values().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["banana", "cherry"]);
}

#[test]
fn test_many_restarts_with_small_threshold() {
    let temp_dir = TempDir::new().unwrap();

    for round in 0..5u32 {
        let store = reopen(&temp_dir, 4);
        for i in 0..7u32 {
            store
                .insert(&format!("r{}-{}", round, i), &item("x", round * 10 + i))
                .unwrap();
        }
        store.remove(&format!("r{}-0", round)).unwrap();
    }

    let store = reopen(&temp_dir, 4);
    assert_eq!(store.len(), 5 * 6);
    assert_eq!(store.get("r3-6").unwrap(), Some(item("x", 36)));
    assert_eq!(store.get("r3-0").unwrap(), None);
}

#[test]
fn test_failed_checkpoint_keeps_write() {
    let temp_dir = TempDir::new().unwrap();
    let store = reopen(&temp_dir, 1);

    // A directory in the way makes every checkpoint fail
    let blocker = temp_dir.path().join("snapshot.tmp");
    fs::create_dir(&blocker).unwrap();

    store.insert("a", &item("apple", 1)).unwrap();
    assert_eq!(store.get("a").unwrap(), Some(item("apple", 1)));
    assert_eq!(store.pending_wal_entries(), 1);
    assert!(!store.snapshot_path().exists());

    store.insert("b", &item("banana", 2)).unwrap();
    assert_eq!(store.remove("a").unwrap(), Some(item("apple", 1)));
    assert_eq!(store.pending_wal_entries(), 3);

    // The next write retries once the way is clear
    fs::remove_dir(&blocker).unwrap();
    store.insert("c", &item("cherry", 3)).unwrap();
    assert_eq!(store.pending_wal_entries(), 0);
    assert!(store.snapshot_path().exists());
    drop(store);

    let store = reopen(&temp_dir, 1);
    let names: Vec<String> = store.values().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["banana", "cherry"]);
}

#[test]
fn test_close_checkpoints_pending_writes() {
    let temp_dir = TempDir::new().unwrap();
    let store = reopen(&temp_dir, 1000);
    store.insert("a", &item("apple", 1)).unwrap();

    store.close().unwrap();

    assert!(temp_dir.path().join("snapshot.db").exists());
    assert_eq!(fs::metadata(temp_dir.path().join("wal.log")).unwrap().len(), 0);
    assert_eq!(reopen(&temp_dir, 1000).get("a").unwrap(), Some(item("apple", 1)));
}

#[test]
fn test_torn_wal_tail_is_dropped_on_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = reopen(&temp_dir, 1000);
        store.insert("a", &item("apple", 1)).unwrap();
        store.insert("b", &item("banana", 2)).unwrap();
    }

    // Simulate a crash mid-append
    let mut wal = OpenOptions::new()
        .append(true)
        .open(temp_dir.path().join("wal.log"))
        .unwrap();
    wal.write_all(&[7u8; 11]).unwrap();
    drop(wal);

    let store = reopen(&temp_dir, 1000);
    assert_eq!(store.len(), 2);

    store.insert("c", &item("cherry", 3)).unwrap();
    drop(store);

    let store = reopen(&temp_dir, 1000);
    assert_eq!(store.len(), 3);
}

#[test]
fn test_unfinished_snapshot_is_discarded() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = reopen(&temp_dir, 1000);
        store.insert("a", &item("apple", 1)).unwrap();
    }
    fs::write(temp_dir.path().join("snapshot.tmp"), b"half written").unwrap();

    let store = reopen(&temp_dir, 1000);

    assert!(!temp_dir.path().join("snapshot.tmp").exists());
    assert_eq!(store.get("a").unwrap(), Some(item("apple", 1)));
}

#[test]
fn test_corrupted_snapshot_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = reopen(&temp_dir, 1000);
        store.insert("a", &item("apple", 1)).unwrap();
        store.checkpoint().unwrap();
    }

    let path = temp_dir.path().join("snapshot.db");
    let mut bytes = fs::read(&path).unwrap();
    bytes[25] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let result: eventease::Result<DurableMap<Item>> =
        DurableMap::open(config_for(&temp_dir, 1000));
    assert!(matches!(result, Err(EventEaseError::Storage(_))));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let result: eventease::Result<DurableMap<Item>> =
        DurableMap::open(config_for(&temp_dir, 0));

    assert!(matches!(result, Err(EventEaseError::Config(_))));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(reopen(&temp_dir, 50));

    let mut handles = Vec::new();
    for t in 0..4u32 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..25u32 {
                let key = format!("t{}-{:02}", t, i);
                store.insert(&key, &item("x", i)).unwrap();
                assert_eq!(store.get(&key).unwrap(), Some(item("x", i)));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 100);
    drop(store);

    assert_eq!(reopen(&temp_dir, 50).len(), 100);
}
