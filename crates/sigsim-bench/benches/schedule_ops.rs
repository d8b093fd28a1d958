//! Criterion benchmarks for alias analysis and schedule derivation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sigsim_bench::chain_model;
use sigsim_sched::{build_schedule, AliasPolicy};

fn bench_schedule_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_chain");
    for depth in [8usize, 64, 256] {
        let model = chain_model(depth, 4, 7).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &model, |b, model| {
            b.iter(|| {
                let schedule = build_schedule(
                    model.operators(),
                    model.signals(),
                    AliasPolicy::Conservative,
                )
                .unwrap();
                black_box(schedule.len());
            });
        });
    }
    group.finish();
}

fn bench_build_chain_64(c: &mut Criterion) {
    c.bench_function("build_chain_64x16", |b| {
        b.iter(|| {
            let sim = chain_model(64, 16, 7).unwrap().build().unwrap();
            black_box(sim.memory_bytes());
        });
    });
}

criterion_group!(benches, bench_schedule_chain, bench_build_chain_64);
criterion_main!(benches);
