//! Store read-path benchmarks
//!
//! Measures prefix search and first-page slicing over a store with a
//! realistic number of customers.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use customer_map::{Customer, IndexedStore};
use tempfile::TempDir;

const CUSTOMER_COUNT: usize = 50_000;

fn populated_store(temp_dir: &TempDir) -> IndexedStore {
    let mut store = IndexedStore::open(temp_dir.path().join("store.json")).unwrap();
    let customers: Vec<Customer> = (0..CUSTOMER_COUNT)
        .map(|i| {
            Customer::new(
                format!("AC{:06}", i),
                format!("Customer {}", i % 977),
                24.0 + (i as f64) * 1e-5,
                73.0 + (i as f64) * 1e-5,
            )
        })
        .collect();
    store.bulk_insert(customers).unwrap();
    store
}

fn bench_store_reads(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let store = populated_store(&temp_dir);

    c.bench_function("get_slice_50", |b| {
        b.iter(|| black_box(store.get_slice(black_box(50))))
    });

    c.bench_function("search_accno_prefix", |b| {
        b.iter(|| black_box(store.search(black_box("ac0123"), 50)))
    });

    c.bench_function("search_name_fallback", |b| {
        b.iter(|| black_box(store.search(black_box("customer 97"), 50)))
    });

    c.bench_function("page_after_cursor", |b| {
        b.iter(|| black_box(store.page_after(black_box(Some("AC025000")), 100)))
    });
}

criterion_group!(benches, bench_store_reads);
criterion_main!(benches);
