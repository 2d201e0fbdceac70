//! Growth strategy examples

use slot_pool::{GrowthStrategy, ObjectPool, PoolConfiguration, PoolError};

fn main() {
    println!("=== slot_pool - Growth ===\n");

    for strategy in [GrowthStrategy::Linear { increment: 4 }, GrowthStrategy::exponential()] {
        trace_growth(strategy);
    }

    reserve_ahead();
    capped_pool();
    configuration_from_text();
}

fn trace_growth(strategy: GrowthStrategy) {
    println!("{strategy}:");
    let config = PoolConfiguration::new()
        .with_initial_capacity(2)
        .with_growth_strategy(strategy);
    let mut pool = ObjectPool::<f64>::new(config).unwrap();

    let mut last_capacity = pool.capacity();
    let mut handles = Vec::new();
    for _ in 0..40 {
        handles.push(pool.borrow().unwrap());
        if pool.capacity() != last_capacity {
            println!("   {} -> {} slots ({} blocks)", last_capacity, pool.capacity(), pool.block_count());
            last_capacity = pool.capacity();
        }
    }

    for handle in handles {
        pool.return_object(handle).unwrap();
    }
    println!();
}

fn reserve_ahead() {
    println!("Reserve before a burst:");
    let mut pool = ObjectPool::with_factory(|| [0u8; 64], PoolConfiguration::default()).unwrap();
    pool.reserve(512).unwrap();
    println!("   Capacity: {}, blocks: {}\n", pool.capacity(), pool.block_count());
}

fn capped_pool() {
    println!("Capped pool:");
    let config = PoolConfiguration::new()
        .with_initial_capacity(2)
        .with_max_capacity(3);
    let mut pool = ObjectPool::<u8>::new(config).unwrap();

    let handles: Vec<_> = (0..3).map(|_| pool.borrow().unwrap()).collect();
    match pool.borrow() {
        Err(err @ PoolError::AllocationFailure { .. }) => println!("   {err}"),
        other => println!("   Unexpected: {other:?}"),
    }
    println!("   Capacity still {}\n", pool.capacity());

    for handle in handles {
        pool.return_object(handle).unwrap();
    }
}

fn configuration_from_text() {
    println!("Configuration from text:");
    for (kind, parameter) in [("linear", 128), ("EXPONENTIAL_GROWTH", 3), ("quadratic", 2), ("linear", 0)] {
        match PoolConfiguration::from_parts(0, kind, parameter) {
            Ok(config) => println!("   {kind} {parameter}: {:?}", config.growth_strategy),
            Err(err) => println!("   {kind} {parameter}: {err}"),
        }
    }
}
