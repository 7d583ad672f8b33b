use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use crpt_gateway::limiter::{GatedInvoker, PeriodUnit, QuotaGate};

fn bench_try_acquire_release(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let gate = runtime.block_on(async { QuotaGate::new(1_000, PeriodUnit::Hours).unwrap() });

    c.bench_function("try_acquire_release", |b| b.iter(|| {
        let permit = black_box(gate.try_acquire());
        drop(permit);
    }));
}

fn bench_gated_invoke(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let gate = runtime.block_on(async {
        Arc::new(QuotaGate::new(1_000, PeriodUnit::Hours).unwrap())
    });
    let invoker = GatedInvoker::new(gate);

    c.bench_function("gated_invoke", |b| b.iter(|| {
        runtime.block_on(invoker.invoke(|| async { Ok(black_box(1u64)) }))
    }));
}

criterion_group!(benches, bench_try_acquire_release, bench_gated_invoke);
criterion_main!(benches);
