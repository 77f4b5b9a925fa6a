//! Dispatch-path benchmark suite.
//!
//! Benchmarks the per-scan and per-retry hot paths: attribute parsing and
//! backoff computation.
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use hx_push::BackoffPolicy;
use hx_push::engine::trigger::{parse_message_names, parse_trigger_specs};

// ============================================================================
// Benchmark: Attribute Parsing
// ============================================================================

fn bench_parse_triggers(c: &mut Criterion) {
    let inputs: &[(&str, &str)] = &[
        ("single_push", "push:refresh"),
        ("mixed", "click once, push:refresh, keyup changed, push:tick"),
        (
            "events_only",
            "click once, keyup changed, mouseover, submit",
        ),
    ];

    let mut group = c.benchmark_group("parse_trigger_specs");
    for (name, value) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), value, |b, value| {
            b.iter(|| parse_trigger_specs(black_box(value)));
        });
    }
    group.finish();
}

fn bench_parse_message_names(c: &mut Criterion) {
    c.bench_function("parse_message_names", |b| {
        b.iter(|| parse_message_names(black_box("update, price, tick, trade, quote")));
    });
}

// ============================================================================
// Benchmark: Backoff Computation
// ============================================================================

fn bench_backoff(c: &mut Criterion) {
    let policy = BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(64));

    let mut group = c.benchmark_group("backoff_delay");
    for retry in [0u32, 7, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(retry), &retry, |b, &retry| {
            b.iter(|| policy.delay_with_jitter(black_box(retry), black_box(0.5)));
        });
    }
    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(
    benches,
    bench_parse_triggers,
    bench_parse_message_names,
    bench_backoff
);
criterion_main!(benches);
