// Orchestration overhead of Saga::execute
//
// - Happy path with no-op steps, varying saga length
// - Full rollback when the last step fails

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use saga::{Saga, SagaConfig, from_fn, noop};
use tokio::runtime::Runtime;

const LENGTHS: [usize; 3] = [1, 10, 100];

fn build_saga(len: usize, fail_last: bool) -> Option<Saga> {
    let config = SagaConfig::new(1, Duration::ZERO).ok()?;
    let mut saga = Saga::in_memory("bench").with_config(config);
    for i in 0..len {
        let name = format!("step-{i}");
        if fail_last && i + 1 == len {
            saga.add_step(name, from_fn(|| Err(anyhow::anyhow!("fail"))), noop())
                .ok()?;
        } else {
            saga.add_step(name, noop(), noop()).ok()?;
        }
    }
    Some(saga)
}

fn bench_execute(c: &mut Criterion) {
    let Ok(rt) = Runtime::new() else {
        return;
    };

    let mut group = c.benchmark_group("execute");
    for len in LENGTHS {
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("success", len), &len, |b, &len| {
            b.iter(|| {
                if let Some(mut saga) = build_saga(len, false) {
                    black_box(rt.block_on(saga.execute()).is_ok());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("rollback", len), &len, |b, &len| {
            b.iter(|| {
                if let Some(mut saga) = build_saga(len, true) {
                    black_box(rt.block_on(saga.execute()).is_err());
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_execute);
criterion_main!(benches);
