//! Borrow/return benchmarks for `slot_pool`.

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use slot_pool::{GrowthStrategy, ObjectPool, PoolConfiguration};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type Pixel = [f32; 4];

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("slot_pool");

    group.bench_function("borrow_return_warm", |b| {
        let mut pool = ObjectPool::<Pixel>::new(PoolConfiguration::new().with_initial_capacity(64)).unwrap();

        b.iter(|| {
            let handle = pool.borrow().unwrap();
            pool.get_mut(handle).unwrap()[0] = black_box(1.0);
            pool.return_object(black_box(handle)).unwrap();
        });
    });

    group.bench_function("borrow_scoped_warm", |b| {
        let mut pool = ObjectPool::<Pixel>::new(PoolConfiguration::new().with_initial_capacity(64)).unwrap();

        b.iter(|| {
            let mut pixel = pool.borrow_scoped().unwrap();
            pixel[0] = black_box(1.0);
        });
    });

    for (name, strategy) in [
        ("fill_1024_linear", GrowthStrategy::Linear { increment: 64 }),
        ("fill_1024_exponential", GrowthStrategy::exponential()),
    ] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || ObjectPool::<Pixel>::new(PoolConfiguration::new().with_growth_strategy(strategy)).unwrap(),
                |mut pool| {
                    for _ in 0..1024 {
                        black_box(pool.borrow().unwrap());
                    }
                    pool
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}
