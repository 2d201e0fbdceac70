//! # slot_pool
//!
//! A recycling object store: pre-allocated, reusable instances of one value
//! type handed out to hot call sites (per-pixel or per-iteration
//! temporaries) so they do not pay for allocation on every use.
//!
//! ## Features
//!
//! - Block-based storage; element addresses never change while the pool lives
//! - Linear or exponential growth, fixed at construction
//! - Borrow/return by handle with foreign-handle and double-return detection
//! - Strong error safety: a failed growth leaves the pool untouched
//! - Optional content reset on return
//! - RAII guard for scoped borrows
//! - Metrics, health status and Prometheus text export
//! - Mutex-wrapped variant for pools shared across threads
//!
//! ## Quick Start
//!
//! ```rust
//! use slot_pool::{ObjectPool, PoolConfiguration};
//!
//! let mut pool = ObjectPool::<[u8; 4]>::new(PoolConfiguration::new().with_initial_capacity(16)).unwrap();
//!
//! let handle = pool.borrow().unwrap();
//! pool.get_mut(handle).unwrap()[0] = 255;
//! pool.return_object(handle).unwrap();
//!
//! assert_eq!(pool.available_count(), 16);
//! ```

mod pool;
mod config;
mod metrics;
mod health;
mod shared;
mod errors;

pub use pool::{Handle, ObjectPool, PooledObject};
pub use config::{GrowthStrategy, PoolConfiguration, ReturnPolicy};
pub use metrics::{MetricsExporter, PoolMetrics};
pub use health::HealthStatus;
pub use shared::SharedObjectPool;
pub use errors::{AllocationFailureReason, PoolError, PoolResult};
