//! Criterion benchmarks for full snapshot rendering.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use kiln_bench::{bench_catalog, chained_bases, reference_schema, stress_schema};
use kiln_core::ModelDef;
use kiln_registry::ModelRegistry;

/// Benchmark: rebuild the 100-type reference snapshot from scratch.
fn bench_render_reference(c: &mut Criterion) {
    let mut schema = reference_schema();
    c.bench_function("render_reference_100", |b| {
        b.iter(|| {
            let registry = schema.concrete_registry().unwrap();
            black_box(registry.len());
        });
    });
}

/// Benchmark: rebuild the 1000-type stress snapshot from scratch.
fn bench_render_stress(c: &mut Criterion) {
    let mut schema = stress_schema();
    c.bench_function("render_stress_1000", |b| {
        b.iter(|| {
            let registry = schema.concrete_registry().unwrap();
            black_box(registry.len());
        });
    });
}

/// Benchmark: a 64-deep base chain fed in worst-case (reverse) order.
fn bench_base_worklist(c: &mut Criterion) {
    let defs = chained_bases(64);
    let refs: Vec<&ModelDef> = defs.iter().rev().collect();
    let catalog = bench_catalog();
    c.bench_function("base_worklist_64", |b| {
        b.iter(|| {
            let registry =
                ModelRegistry::render_all(Arc::clone(&catalog), &refs, None).unwrap();
            black_box(registry.len());
        });
    });
}

criterion_group!(
    benches,
    bench_render_reference,
    bench_render_stress,
    bench_base_worklist
);
criterion_main!(benches);
