//! Live query benchmarks
//!
//! Measures the per-render cost of the binding layer against the in-process
//! store.
//!
//! ## Benchmark Structure
//! 1. Descriptor building and equality (runs on every render pass)
//! 2. Activation: replaying a descriptor and opening a channel
//! 3. Fan-out: one write delivered to N open scopes
//!
//! ## Running Benchmarks
//! ```bash
//! cargo bench --bench live_query_bench
//!
//! # Specific benchmark
//! cargo bench --bench live_query_bench -- fan_out/64
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use firestore_live::{fire_query, FilterOp, LiveQuery, MemoryStore, QueryDescriptor};
use once_cell::sync::Lazy;
use serde_json::json;

/// Store seeded with 1000 users, shared by every benchmark
static STORE: Lazy<MemoryStore> = Lazy::new(|| {
    let store = MemoryStore::new();
    for i in 0..1000 {
        store
            .set_document(
                &format!("users/user{:04}", i),
                json!({"name": format!("user {}", i), "age": i % 90, "active": i % 3 == 0}),
            )
            .expect("Failed to seed store");
    }
    store
});

/// Scope counts to test
const FAN_OUT_LEVELS: &[usize] = &[1, 8, 64, 256];

fn active_users() -> QueryDescriptor {
    fire_query()
        .collection("users")
        .where_field("active", FilterOp::Equal, true)
        .where_field("age", FilterOp::GreaterThanOrEqual, 21)
        .limit(25)
}

// ============================================================================
// Descriptor Benchmarks
// ============================================================================

fn bench_descriptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptor");

    group.bench_function("build", |b| b.iter(|| black_box(active_users())));

    let left = active_users();
    let right = active_users();
    group.bench_function("equal_by_value", |b| {
        b.iter(|| black_box(&left) == black_box(&right))
    });

    let shared = left.clone();
    group.bench_function("equal_shared", |b| {
        b.iter(|| black_box(&left) == black_box(&shared))
    });

    group.finish();
}

// ============================================================================
// Activation Benchmarks
// ============================================================================

fn bench_activation(c: &mut Criterion) {
    let mut group = c.benchmark_group("activation");

    group.bench_function("subscribe_and_close", |b| {
        b.iter(|| {
            let mut scope = LiveQuery::new(STORE.clone());
            black_box(active_users().use_result(&mut scope));
        })
    });

    // Re-render with an equal descriptor: must not touch the store
    let mut scope = LiveQuery::new(STORE.clone());
    active_users().use_result(&mut scope);
    group.bench_function("rerender_unchanged", |b| {
        b.iter(|| black_box(active_users().use_result(&mut scope)))
    });

    group.finish();
}

// ============================================================================
// Fan-out Benchmarks
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for &scopes in FAN_OUT_LEVELS {
        let store = MemoryStore::new();
        store
            .set_document("rooms/lobby", json!({"topic": "hello"}))
            .expect("Failed to seed store");
        let mut open: Vec<_> = (0..scopes).map(|_| LiveQuery::new(store.clone())).collect();
        for scope in &mut open {
            fire_query().doc("rooms/lobby").use_result(scope);
        }

        group.throughput(Throughput::Elements(scopes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(scopes), &scopes, |b, _| {
            let mut counter = 0u64;
            b.iter(|| {
                counter += 1;
                store
                    .update_document("rooms/lobby", json!({"counter": counter}))
                    .expect("Failed to update");
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_descriptor, bench_activation, bench_fan_out);
criterion_main!(benches);
