use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_minifut::{pair, when_all, Future};

fn pair_completion_benchmark(c: &mut Criterion) {
    c.bench_function("pair_set_then_get", |b| {
        b.iter(|| {
            let (mut promise, mut future) = pair::<u64>();
            promise.set_value(black_box(42)).unwrap();
            black_box(future.get().unwrap());
        })
    });
}

fn chain_dispatch_benchmark(c: &mut Criterion) {
    c.bench_function("then_chain_depth_16", |b| {
        b.iter(|| {
            let (mut promise, mut future) = pair::<u64>();
            let mut tail = future.then(|v| v + 1).unwrap();
            for _ in 1..16 {
                tail = tail.then(|v| v + 1).unwrap();
            }
            promise.set_value(black_box(0)).unwrap();
            black_box(tail.get().unwrap());
        })
    });

    c.bench_function("then_inline_on_ready", |b| {
        b.iter(|| {
            let mut future = Future::ready(black_box(1u64));
            let mut tail = future.then(|v| v * 2).unwrap();
            black_box(tail.get().unwrap());
        })
    });
}

fn join_fan_in_benchmark(c: &mut Criterion) {
    c.bench_function("when_all_32_ready", |b| {
        b.iter(|| {
            let futures: Vec<_> = (0..32).map(|i| Future::ready(i as u64)).collect();
            let mut joined = when_all(futures).unwrap();
            black_box(joined.get().unwrap());
        })
    });

    c.bench_function("when_all_32_pending", |b| {
        b.iter(|| {
            let mut promises = Vec::with_capacity(32);
            let mut futures = Vec::with_capacity(32);
            for i in 0..32u64 {
                let (promise, future) = pair::<u64>();
                promises.push((i, promise));
                futures.push(future);
            }
            let mut joined = when_all(futures).unwrap();
            for (i, mut promise) in promises {
                promise.set_value(i).unwrap();
            }
            black_box(joined.get().unwrap());
        })
    });
}

criterion_group!(
    benches,
    pair_completion_benchmark,
    chain_dispatch_benchmark,
    join_fan_in_benchmark
);
criterion_main!(benches);
