use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::NamedTempFile;

use libradb::buffer::BufferPool;
use libradb::config::PAGE_SIZE;
use libradb::field::{FieldType, Value};
use libradb::index::BPlusTree;
use libradb::storage::disk::DiskManager;
use libradb::storage::record::Record;
use libradb::storage::schema::Schema;
use std::sync::Arc;

fn schema() -> Schema {
    Schema::new(vec![
        ("id".into(), FieldType::integer(false)),
        ("name".into(), FieldType::varchar(32, true).unwrap()),
        ("age".into(), FieldType::integer(true)),
    ])
}

fn record(id: i32) -> Record {
    Record::data(
        0,
        vec![
            Value::Integer(id),
            Value::Varchar(format!("name-{id}")),
            Value::Integer(id % 100),
        ],
    )
}

fn populated_tree(order: usize, rows: i32) -> BPlusTree {
    let tmp = NamedTempFile::new().unwrap();
    let disk = Arc::new(DiskManager::open(tmp.path(), PAGE_SIZE).unwrap());
    let pool = Arc::new(BufferPool::new(disk, schema(), 4096, 2));
    let tree = BPlusTree::new(order, schema(), pool).unwrap();
    for id in 0..rows {
        tree.put(Value::Integer(id), record(id)).unwrap();
    }
    tree
}

fn bench_sequential_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_insert");
    for rows in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| populated_tree(64, rows));
        });
    }
    group.finish();
}

fn bench_point_lookup(c: &mut Criterion) {
    let tree = populated_tree(64, 10_000);
    let mut group = c.benchmark_group("point_lookup");
    group.bench_function("hit", |b| {
        b.iter(|| tree.get(&Value::Integer(5_000)).unwrap());
    });
    group.bench_function("miss", |b| {
        b.iter(|| tree.get(&Value::Integer(-1)).unwrap());
    });
    group.finish();
}

fn bench_range_scan(c: &mut Criterion) {
    let tree = populated_tree(64, 10_000);
    c.bench_function("range_scan_1000", |b| {
        b.iter(|| {
            let mut it = tree.scan(&Value::Integer(2_000)).unwrap();
            let mut n = 0;
            while n < 1_000 && it.next().unwrap().is_some() {
                n += 1;
            }
        });
    });
}

criterion_group!(name = benches;
                 config = Criterion::default();
                 targets = bench_sequential_insert, bench_point_lookup, bench_range_scan);
criterion_main!(benches);
