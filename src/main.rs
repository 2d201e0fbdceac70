// slot_pool demo binary
// Run with RUST_LOG=slot_pool=trace to see every borrow, return and growth step.
// More usage in demos/: cargo run --example basic

use slot_pool::{GrowthStrategy, ObjectPool, PoolConfiguration, PoolResult};
use tracing_subscriber::EnvFilter;

fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slot_pool=debug")),
        )
        .init();

    println!("=== slot_pool ===");

    let config = PoolConfiguration::new()
        .with_initial_capacity(2)
        .with_growth_strategy(GrowthStrategy::exponential());
    let mut pool = ObjectPool::<[f32; 3]>::new(config)?;

    let handles = (0..3).map(|_| pool.borrow()).collect::<PoolResult<Vec<_>>>()?;
    println!("  Strategy: {}", pool.growth_strategy());
    println!("  Capacity after 3 borrows: {}", pool.capacity());

    for handle in handles {
        pool.return_object(handle)?;
    }

    println!("  Available after return: {}", pool.available_count());
    println!("  {pool:?}");

    Ok(())
}
