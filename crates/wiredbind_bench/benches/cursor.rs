//! Cursor operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wiredbind_bench::{key, random_data, random_keys, BenchStore};

/// Benchmark single inserts with varying value sizes.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut store = BenchStore::open().unwrap();
            let mut cursor = store.cursor().unwrap();
            let value = random_data(size);
            let mut n = 0u64;

            b.iter(|| {
                cursor.insert(&key(n), black_box(&value)).unwrap();
                n += 1;
            });
        });
    }
    group.finish();
}

/// Benchmark batches of inserts inside one transaction.
fn bench_transaction_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction_batch");

    for batch_size in [10u64, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let mut store = BenchStore::open().unwrap();
                let value = random_data(256);

                b.iter(|| {
                    store
                        .session
                        .transaction("", |s| {
                            let mut cursor = s.open_cursor(wiredbind_bench::BENCH_TABLE, "")?;
                            for n in 0..batch_size {
                                cursor.insert(&key(n), black_box(&value))?;
                            }
                            cursor.close()
                        })
                        .unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark point lookups against a populated table.
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for count in [1_000u64, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut store = BenchStore::populated(count, 128).unwrap();
            let mut cursor = store.cursor().unwrap();
            let keys = random_keys(256, count);
            let mut i = 0;

            b.iter(|| {
                let found = cursor.search(black_box(&keys[i % keys.len()])).unwrap();
                assert!(found);
                i += 1;
                black_box(cursor.value().unwrap())
            });
        });
    }
    group.finish();
}

/// Benchmark a full forward scan.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for count in [1_000u64, 10_000].iter() {
        group.throughput(Throughput::Elements(*count));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut store = BenchStore::populated(count, 64).unwrap();
            let mut cursor = store.cursor().unwrap();

            b.iter(|| {
                let mut seen = 0u64;
                while cursor.next().unwrap() {
                    seen += 1;
                }
                cursor.reset().unwrap();
                black_box(seen)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_transaction_batch,
    bench_search,
    bench_scan,
);
criterion_main!(benches);
