//! Benchmarks for history queries on run start and per display tick
//!
//! Covers the O(segments × runs) work done:
//! - once per run start (comparison snapshot capture)
//! - every overlay tick (view building while idle and while running)
//!
//! Platform: Cross-platform (generated in-memory history, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use splitwatch::comparison::ComparisonSnapshot;
use splitwatch::engine::{ManualClock, TimingEngine};
use splitwatch::history::{HistoryStore, personal_best, sum_of_best};
use splitwatch::test_utils::generated_history;
use splitwatch::{HistoryTree, SplitDefinition, ViewOptions};
use std::hint::black_box;
use std::sync::Arc;

const RUN_COUNTS: [usize; 3] = [10, 100, 500];

fn segment_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Segment {}", i + 1)).collect()
}

fn bench_snapshot_capture(c: &mut Criterion) {
    let segments = segment_names(20);
    let mut group = c.benchmark_group("snapshot_capture");

    for runs in RUN_COUNTS {
        let history = generated_history(runs, &segments);
        group.throughput(Throughput::Elements((runs * segments.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(runs), &history, |b, history| {
            b.iter(|| black_box(ComparisonSnapshot::capture(black_box(&segments), history)))
        });
    }

    group.finish();
}

fn bench_live_totals(c: &mut Criterion) {
    let segments = segment_names(20);
    let history = generated_history(100, &segments);

    c.bench_function("personal_best_100_runs", |b| {
        b.iter(|| black_box(personal_best(black_box(&history)).map(|pb| pb.total)))
    });

    c.bench_function("sum_of_best_100_runs", |b| {
        b.iter(|| black_box(sum_of_best(black_box(&segments), &history)))
    });
}

fn bench_view_build(c: &mut Criterion) {
    let segments = segment_names(20);
    let mut tree = HistoryTree::new();
    tree.entry("Game".to_string())
        .or_default()
        .insert("Any%".to_string(), generated_history(100, &segments));
    let history = HistoryStore::from_tree(None, tree, "Game", "Any%");

    let definition = SplitDefinition::new("Game", "Any%", segments.clone())
        .expect("generated segment names are valid");
    let clock = Arc::new(ManualClock::new(0.0));
    let engine = TimingEngine::with_clock(definition, history, clock.clone());

    let mut group = c.benchmark_group("view_build");

    group.bench_function("idle", |b| b.iter(|| black_box(engine.view(ViewOptions::default()))));

    engine.start();
    for _ in 0..10 {
        clock.advance(30.0);
        engine.split();
    }
    clock.advance(12.5);

    group.bench_function("running_mid_run", |b| {
        b.iter(|| black_box(engine.view(ViewOptions::default())))
    });

    group.finish();
}

criterion_group!(benches, bench_snapshot_capture, bench_live_totals, bench_view_build);
criterion_main!(benches);
