//! Throughput Benchmark for ttlkv
//!
//! This benchmark measures the performance of the TTL store
//! under various workloads.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use ttlkv::{StoreConfig, TtlStore};

/// Builds a store whose sweeper stays out of the measurements.
fn new_store(runtime: &Runtime) -> TtlStore<String> {
    let _guard = runtime.enter();
    TtlStore::with_config(StoreConfig::default().with_sweep_interval(Duration::from_secs(3600)))
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let store = new_store(&runtime);

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(format!("key:{}", i), "small_value".to_string(), Duration::from_secs(600));
            i += 1;
        });
    });

    group.bench_function("set_default_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set_default(format!("default:{}", i), "value".to_string());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let store = new_store(&runtime);

    // Pre-populate with data
    for i in 0..100_000 {
        store.set(format!("key:{}", i), format!("value:{}", i), Duration::from_secs(600));
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let _ = black_box(store.get(&format!("key:{}", i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let _ = black_box(store.get(&format!("missing:{}", i)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let store = new_store(&runtime);

    // Pre-populate
    for i in 0..10_000 {
        store.set(format!("key:{}", i), format!("value:{}", i), Duration::from_secs(600));
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                // 20% writes
                store.set(format!("new:{}", i), "value".to_string(), Duration::from_secs(600));
            } else {
                // 80% reads
                let _ = black_box(store.get(&format!("key:{}", i % 10_000)));
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let runtime = Runtime::new().unwrap();

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let store = Arc::new(new_store(&runtime));
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            store.set(key.clone(), "value".to_string(), Duration::from_secs(600));
                            let _ = store.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.len());
        });
    });

    group.finish();
}

/// Benchmark expiry bookkeeping
fn bench_expiry(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let store = new_store(&runtime);

    // Pre-create keys
    for i in 0..10_000 {
        store.set(format!("refresh:{}", i), "value".to_string(), Duration::from_secs(600));
    }

    let mut group = c.benchmark_group("expiry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("refresh_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            // Alternate deadlines so the heap record moves both ways
            let ttl = Duration::from_secs(300 + (i % 2) * 600);
            store.set(format!("refresh:{}", i % 10_000), "value".to_string(), ttl);
            i += 1;
        });
    });

    group.bench_function("sweep_10k_expired", |b| {
        b.iter_batched(
            || {
                let store = new_store(&runtime);
                for i in 0..10_000 {
                    store.set(format!("key:{}", i), "value".to_string(), Duration::from_nanos(1));
                }
                store
            },
            |store| black_box(store.sweep_expired()),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_concurrent,
    bench_expiry,
);

criterion_main!(benches);
