//! Basic usage examples for ObjectPool

use slot_pool::{ObjectPool, PoolConfiguration, PoolError, ReturnPolicy};

fn main() {
    println!("=== slot_pool - Basic Examples ===\n");

    // Example 1: Borrow and return by handle
    borrow_and_return();

    // Example 2: Scoped borrows
    scoped_borrow();

    // Example 3: Contract violations
    contract_violations();

    // Example 4: Reset on return
    reset_on_return();

    // Example 5: Metrics and health
    metrics_and_health();
}

fn borrow_and_return() {
    println!("1. Borrow and Return:");
    let mut pool = ObjectPool::<[u8; 4]>::new(PoolConfiguration::new().with_initial_capacity(3)).unwrap();

    let handle = pool.borrow().unwrap();
    pool.get_mut(handle).unwrap()[0] = 200;
    println!("   Borrowed {handle}: {:?}", pool.get(handle).unwrap());
    println!("   Available while borrowed: {}", pool.available_count());

    pool.return_object(handle).unwrap();
    println!("   Available after return: {}\n", pool.available_count());
}

fn scoped_borrow() {
    println!("2. Scoped Borrow:");
    let mut pool = ObjectPool::<String>::new(PoolConfiguration::default()).unwrap();

    {
        let mut scratch = pool.borrow_scoped().unwrap();
        scratch.push_str("per-iteration temporary");
        println!("   Using: {}", *scratch);
        // Returned when `scratch` goes out of scope
    }

    println!("   Borrowed after scope: {}\n", pool.borrowed_count());
}

fn contract_violations() {
    println!("3. Contract Violations:");
    let mut pool = ObjectPool::<u32>::new(PoolConfiguration::new().with_initial_capacity(1)).unwrap();
    let mut other = ObjectPool::<u32>::new(PoolConfiguration::new().with_initial_capacity(1)).unwrap();

    let handle = pool.borrow().unwrap();

    match other.return_object(handle) {
        Err(err @ PoolError::InvalidHandle { .. }) => println!("   Foreign pool: {err}"),
        other => println!("   Unexpected: {other:?}"),
    }

    pool.return_object(handle).unwrap();

    match pool.return_object(handle) {
        Err(err @ PoolError::DoubleReturn { .. }) => println!("   Second return: {err}\n"),
        other => println!("   Unexpected: {other:?}\n"),
    }
}

fn reset_on_return() {
    println!("4. Reset on Return:");
    let config = PoolConfiguration::new()
        .with_initial_capacity(1)
        .with_return_policy(ReturnPolicy::Reset);
    let mut pool = ObjectPool::<Vec<u32>>::new(config).unwrap();

    let handle = pool.borrow().unwrap();
    pool.get_mut(handle).unwrap().extend([1, 2, 3]);
    pool.return_object(handle).unwrap();

    let handle = pool.borrow().unwrap();
    println!("   Contents after reuse: {:?}\n", pool.get(handle).unwrap());
    pool.return_object(handle).unwrap();
}

fn metrics_and_health() {
    println!("5. Metrics and Health:");
    let mut pool = ObjectPool::<u64>::new(PoolConfiguration::new().with_initial_capacity(4)).unwrap();

    let handles: Vec<_> = (0..4).map(|_| pool.borrow().unwrap()).collect();

    let health = pool.health_status();
    println!("   Health: {}", if health.is_healthy { "Healthy" } else { "Unhealthy" });
    println!("   Utilization: {:.1}%", health.utilization * 100.0);
    for warning in &health.warnings {
        println!("   Warning: {warning}");
    }

    for handle in handles {
        pool.return_object(handle).unwrap();
    }

    let mut metrics: Vec<_> = pool.export_metrics().into_iter().collect();
    metrics.sort();
    println!("\n   Metrics:");
    for (key, value) in metrics {
        println!("     {}: {}", key, value);
    }
}
