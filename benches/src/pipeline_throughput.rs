use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use futures::StreamExt;
use observable_stream::prelude::*;
use tokio::runtime::Runtime;

const VALUES: u64 = 10_000;

fn values() -> Vec<u64> {
    (0..VALUES).collect()
}

/// Benchmark draining an adapted source under each buffer policy
///
/// - unbounded: every value is queued
/// - drop_newest: the synchronous source overruns the buffer, most values are dropped
fn bench_adapter_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapter_buffer_policy");
    let runtime = Runtime::new().unwrap();

    for (policy_name, policy) in [
        ("unbounded", BufferPolicy::Unbounded),
        ("drop_newest_1024", BufferPolicy::DropNewest { capacity: 1024 }),
    ] {
        let config = AdapterConfig::new().with_buffer_policy(policy);

        let bench = |input: Vec<u64>| async move {
            let stream = adapt_with(of::<_, ()>(input), &config).unwrap();
            let count = stream.count().await;
            black_box(count);
        };

        group.bench_with_input(BenchmarkId::from_parameter(policy_name), &policy_name, |b, _| {
            b.to_async(&runtime).iter_batched(values, bench, BatchSize::SmallInput);
        });
    }

    group.finish();
}

/// Benchmark pipeline depth: 0, 1, 4 and 16 itemwise stages
fn bench_pipeline_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_depth");
    let runtime = Runtime::new().unwrap();

    for depth in [0usize, 1, 4, 16] {
        let bench = |input: Vec<u64>| async move {
            let pipeline = (0..depth).fold(Pipeline::<u64, ()>::new(), |pipeline, _| {
                pipeline.stage(map(|v: u64| v.wrapping_add(1)))
            });
            let count = pipeline.into_stream(of(input)).count().await;
            black_box(count);
        };

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.to_async(&runtime).iter_batched(values, bench, BatchSize::SmallInput);
        });
    }

    group.finish();
}

/// Benchmark the full push-to-push round trip through the converter task
fn bench_push_round_trip(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();

    c.bench_function("push_round_trip", |b| {
        b.to_async(&runtime).iter_batched(
            values,
            |input| async move {
                let result = Pipeline::<u64, ()>::new()
                    .stage(identity())
                    .apply(of(input));
                let count = adapt(result).count().await;
                black_box(count);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_adapter_policies,
    bench_pipeline_depth,
    bench_push_round_trip
);
criterion_main!(benches);
