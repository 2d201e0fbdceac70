//! One pool per worker versus one shared pool

use std::sync::Arc;
use std::thread;

use slot_pool::{ObjectPool, PoolConfiguration, SharedObjectPool};

const WORKERS: usize = 4;
const ROWS_PER_WORKER: usize = 1000;

fn main() {
    println!("=== slot_pool - Threads ===\n");

    per_worker_pools();
    shared_pool();
}

fn per_worker_pools() {
    println!("Per-worker pools:");
    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            thread::spawn(|| {
                let mut pool = ObjectPool::<[u16; 3]>::new(PoolConfiguration::new().with_initial_capacity(8)).unwrap();
                for row in 0..ROWS_PER_WORKER {
                    let mut pixel = pool.borrow_scoped().unwrap();
                    pixel[0] = (row % 256) as u16;
                }
                pool.capacity()
            })
        })
        .collect();

    for (index, worker) in workers.into_iter().enumerate() {
        println!("   Worker {index} capacity: {}", worker.join().unwrap());
    }
    println!();
}

fn shared_pool() {
    println!("Shared pool:");
    let pool = Arc::new(SharedObjectPool::<[u16; 3]>::new(PoolConfiguration::default()).unwrap());

    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for row in 0..ROWS_PER_WORKER {
                    let handle = pool.borrow().unwrap();
                    pool.with_object(handle, |pixel| pixel[0] = (row % 256) as u16).unwrap();
                    pool.return_object(handle).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let metrics = pool.metrics();
    println!("   Borrows: {}, capacity: {}", metrics.total_borrowed, metrics.capacity);
}
