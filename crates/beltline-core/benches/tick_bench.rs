//! Criterion benchmarks for the line engine.
//!
//! - `tick`: one step over a belt holding 50 / 500 / 5000 cars.
//! - `ingest`: decode plus classify plus spawn for a burst of messages.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use beltline_core::decode::decode_str;
use beltline_core::engine::LineEngine;
use beltline_core::test_utils::*;

fn populated_engine(cars: i32) -> LineEngine {
    let (mut engine, tx) = test_engine();
    for b in 0..cars {
        let family = if b % 3 == 0 { "x00W" } else { "x94W" };
        tx.enqueue(vehicle(b, family, "1K6"));
    }
    engine.step(0.0);
    engine
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for cars in [50, 500, 5000] {
        let mut engine = populated_engine(cars);
        group.bench_with_input(BenchmarkId::from_parameter(cars), &cars, |b, _| {
            b.iter(|| {
                engine.step(1.0 / 60.0);
                engine.drain_events();
            });
        });
    }
    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let payloads: Vec<String> = (0..100)
        .map(|b| {
            format!(
                r#"{{"bodyNo":"{b}","katashiki":"MAXH10L","colorExtCode":" 2yb","carFamily":"x00W","loDate":"20250911"}}"#
            )
        })
        .collect();

    c.bench_function("ingest_100_messages", |b| {
        b.iter_batched(
            test_engine,
            |(mut engine, tx)| {
                for p in &payloads {
                    if let Ok(event) = decode_str(p) {
                        tx.enqueue(event);
                    }
                }
                engine.step(0.0)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_tick, bench_ingest);
criterion_main!(benches);
