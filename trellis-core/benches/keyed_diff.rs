//! Keyed children diff benchmarks
//!
//! Each iteration renders a keyed list into a fresh `MemoryHost` and then
//! patches it to a reordered version of itself.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use trellis_core::props;
use trellis_core::runtime::{create_renderer, h, longest_increasing_subsequence, MemoryHost, VNode};

// =============================================================================
// Test Data Generation
// =============================================================================

fn keyed_list(keys: &[usize]) -> VNode {
    h(
        "ul",
        None,
        keys.iter()
            .map(|k| h("li", props! { "key" => *k }, k.to_string()))
            .collect::<Vec<_>>(),
    )
}

/// Deterministic interleaving that leaves short increasing runs.
fn shuffled(n: usize) -> Vec<usize> {
    let mut keys: Vec<usize> = (0..n).collect();
    let mut state = 0x2545_f491_u64;
    for i in (1..n).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        keys.swap(i, (state % (i as u64 + 1)) as usize);
    }
    keys
}

fn patch(before: &[usize], after: &[usize]) {
    let host = Arc::new(MemoryHost::new());
    let root = host.create_root();
    let renderer = create_renderer(host);
    renderer
        .render(Some(&keyed_list(before)), root)
        .expect("initial render");
    renderer
        .render(Some(&keyed_list(after)), root)
        .expect("patch");
}

// =============================================================================
// Diff Benchmarks
// =============================================================================

fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_reorder");

    for size in [10usize, 100, 1000] {
        let before: Vec<usize> = (0..size).collect();
        let reversed: Vec<usize> = before.iter().rev().copied().collect();
        let random = shuffled(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("reverse", size), &size, |b, _| {
            b.iter(|| patch(black_box(&before), black_box(&reversed)));
        });
        group.bench_with_input(BenchmarkId::new("shuffle", size), &size, |b, _| {
            b.iter(|| patch(black_box(&before), black_box(&random)));
        });
    }

    group.finish();
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_append");

    for size in [100usize, 1000] {
        let before: Vec<usize> = (0..size).collect();
        let after: Vec<usize> = (0..size + size / 10).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| patch(black_box(&before), black_box(&after)));
        });
    }

    group.finish();
}

fn bench_lis(c: &mut Criterion) {
    let mut group = c.benchmark_group("longest_increasing_subsequence");

    for size in [100usize, 1000, 10_000] {
        let input: Vec<usize> = shuffled(size).into_iter().map(|k| k + 1).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| black_box(longest_increasing_subsequence(black_box(input))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reorder, bench_append, bench_lis);
criterion_main!(benches);
