//! End-to-end scenarios exercised against the public API only: build a
//! buffer pool and tree, drive it through puts/gets/deletes/scans, and
//! check the outcomes a caller would actually observe.

use std::sync::Arc;

use tempfile::NamedTempFile;

use libradb::buffer::BufferPool;
use libradb::config::PAGE_SIZE;
use libradb::error::StorageError;
use libradb::field::{FieldType, Value};
use libradb::index::BPlusTree;
use libradb::storage::disk::DiskManager;
use libradb::storage::record::Record;
use libradb::storage::schema::Schema;

fn schema() -> Schema {
    Schema::new(vec![
        ("id".into(), FieldType::integer(false)),
        ("name".into(), FieldType::varchar(32, true).unwrap()),
        ("age".into(), FieldType::integer(true)),
        ("is_student".into(), FieldType::boolean(true)),
        ("score".into(), FieldType::float(true)),
    ])
}

fn row(id: i32, name: &str, age: i32, is_student: bool, score: f32) -> Record {
    Record::data(
        0,
        vec![
            Value::Integer(id),
            Value::Varchar(name.to_string()),
            Value::Integer(age),
            Value::Boolean(is_student),
            Value::Float(score),
        ],
    )
}

fn tree(order: usize, pool_capacity: usize) -> BPlusTree {
    let tmp = NamedTempFile::new().unwrap();
    let disk = Arc::new(DiskManager::open(tmp.path(), PAGE_SIZE).unwrap());
    let pool = Arc::new(BufferPool::new(disk, schema(), pool_capacity, 2));
    BPlusTree::new(order, schema(), pool).unwrap()
}

#[test]
fn empty_tree_lookup_returns_none() {
    let tree = tree(1, 64);
    assert_eq!(tree.get(&Value::Integer(42)).unwrap(), None);
}

#[test]
fn single_row_round_trips_through_put_and_get() {
    let tree = tree(1, 64);
    tree.put(Value::Integer(4), row(4, "Alice", 20, true, 90.5)).unwrap();

    assert_eq!(
        tree.get(&Value::Integer(4)).unwrap(),
        Some(row(4, "Alice", 20, true, 90.5))
    );
    assert_eq!(tree.get(&Value::Integer(3)).unwrap(), None);
}

#[test]
fn order_one_tree_grows_past_height_two_under_nine_inserts() {
    let tree = tree(1, 64);
    for id in [4, 9, 6, 2, 7, 8, 3, 5, 1] {
        tree.put(Value::Integer(id), row(id, "n", 18, false, 0.0)).unwrap();
    }

    for id in 1..=9 {
        assert_eq!(
            tree.get(&Value::Integer(id)).unwrap().map(|r| r.key().clone()),
            Some(Value::Integer(id)),
            "key {id} missing after growth"
        );
    }
    assert!(tree.height() >= 3);
}

#[test]
fn duplicate_insert_fails_and_keeps_the_first_row() {
    let tree = tree(2, 64);
    tree.put(Value::Integer(4), row(4, "Alice", 20, true, 90.5)).unwrap();

    let err = tree
        .put(Value::Integer(4), row(4, "Eve", 99, false, 1.0))
        .unwrap_err();
    assert!(matches!(err, StorageError::KeyExists));
    assert_eq!(
        tree.get(&Value::Integer(4)).unwrap(),
        Some(row(4, "Alice", 20, true, 90.5))
    );
}

#[test]
fn repeated_delete_of_an_absent_key_changes_nothing() {
    let tree = tree(2, 64);
    tree.put(Value::Integer(4), row(4, "Alice", 20, true, 90.5)).unwrap();

    for _ in 0..5 {
        tree.delete(&Value::Integer(5)).unwrap();
    }
    assert_eq!(
        tree.get(&Value::Integer(4)).unwrap(),
        Some(row(4, "Alice", 20, true, 90.5))
    );
}

#[test]
fn buffer_pool_evicts_and_rehydrates_byte_identical_pages() {
    let tmp = NamedTempFile::new().unwrap();
    let disk = Arc::new(DiskManager::open(tmp.path(), PAGE_SIZE).unwrap());
    let pool = Arc::new(BufferPool::new(disk, schema(), 5, 2));

    let first = pool.apply_new_blank_page(true).unwrap();
    let first_number = first.page_number();
    first.append(row(1, "a", 1, true, 1.0));
    let first_bytes_before = first.buffer(&schema()).unwrap();
    pool.unpin(first_number, true);

    for _ in 0..4 {
        let page = pool.apply_new_blank_page(true).unwrap();
        pool.unpin(page.page_number(), false);
    }

    // a sixth page, with every frame either evictable or free, should
    // succeed by evicting the first page rather than erroring out.
    let sixth = pool.apply_new_blank_page(true).unwrap();
    pool.unpin(sixth.page_number(), false);

    let rehydrated = pool.fetch_page(first_number).unwrap();
    assert_eq!(rehydrated.buffer(&schema()).unwrap(), first_bytes_before);
}

#[test]
fn buffer_pool_full_when_every_frame_stays_pinned() {
    let tmp = NamedTempFile::new().unwrap();
    let disk = Arc::new(DiskManager::open(tmp.path(), PAGE_SIZE).unwrap());
    let pool = Arc::new(BufferPool::new(disk, schema(), 1, 2));

    let _held = pool.apply_new_blank_page(true).unwrap();
    let err = pool.apply_new_blank_page(true).unwrap_err();
    assert!(matches!(err, StorageError::BufferPoolFull));
}

#[test]
fn scan_then_reverse_scan_visits_every_row_exactly_once_each_way() {
    let tree = tree(2, 64);
    for id in [5, 2, 8, 1, 9, 3, 7, 4, 6, 10] {
        tree.put(Value::Integer(id), row(id, "n", 18, false, 0.0)).unwrap();
    }

    let mut it = tree.scan(&Value::Integer(3)).unwrap();
    let mut forward = Vec::new();
    while let Some(r) = it.next().unwrap() {
        forward.push(r.key().clone());
    }
    assert_eq!(forward, (3..=10).map(Value::Integer).collect::<Vec<_>>());
    assert!(it.next().unwrap().is_none());

    let mut backward = Vec::new();
    while let Some(r) = it.prev().unwrap() {
        backward.push(r.key().clone());
    }
    assert_eq!(
        backward,
        (1..=10).rev().map(Value::Integer).collect::<Vec<_>>()
    );
    assert!(it.prev().unwrap().is_none());
}

#[test]
fn delete_then_reinsert_of_the_same_key_succeeds_with_new_data() {
    let tree = tree(2, 64);
    tree.put(Value::Integer(4), row(4, "Alice", 20, true, 90.5)).unwrap();
    tree.delete(&Value::Integer(4)).unwrap();
    assert_eq!(tree.get(&Value::Integer(4)).unwrap(), None);

    tree.put(Value::Integer(4), row(4, "Alice2", 21, true, 92.0)).unwrap();
    assert_eq!(
        tree.get(&Value::Integer(4)).unwrap(),
        Some(row(4, "Alice2", 21, true, 92.0))
    );
}
