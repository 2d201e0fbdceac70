//! Lock-wrapped pool for embedders that must share one pool across threads

use parking_lot::Mutex;

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::metrics::PoolMetrics;
use crate::pool::{Handle, ObjectPool};

/// An [`ObjectPool`] behind a mutex.
///
/// Every operation takes the lock, so contended use loses the pool's cheap
/// borrow/return profile. Giving each worker its own `ObjectPool` avoids the
/// lock entirely and is preferable whenever the workload allows it.
///
/// Elements are reached through [`with_object()`][Self::with_object], which
/// holds the lock for the duration of the closure.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use slot_pool::{PoolConfiguration, SharedObjectPool};
///
/// let pool = Arc::new(SharedObjectPool::<u64>::new(PoolConfiguration::default()).unwrap());
///
/// let workers: Vec<_> = (0..4)
///     .map(|i| {
///         let pool = Arc::clone(&pool);
///         thread::spawn(move || {
///             let handle = pool.borrow().unwrap();
///             pool.with_object(handle, |value| *value = i).unwrap();
///             pool.return_object(handle).unwrap();
///         })
///     })
///     .collect();
///
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// assert_eq!(pool.borrowed_count(), 0);
/// ```
#[derive(Debug)]
pub struct SharedObjectPool<T> {
    inner: Mutex<ObjectPool<T>>,
}

impl<T: Default + 'static> SharedObjectPool<T> {
    pub fn new(config: PoolConfiguration) -> PoolResult<Self> {
        Ok(Self::from_pool(ObjectPool::new(config)?))
    }
}

impl<T> SharedObjectPool<T> {
    pub fn with_factory<F>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: FnMut() -> T + Send + 'static,
    {
        Ok(Self::from_pool(ObjectPool::with_factory(factory, config)?))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: ObjectPool<T>) -> Self {
        Self {
            inner: Mutex::new(pool),
        }
    }

    /// Unwrap the inner pool.
    pub fn into_inner(self) -> ObjectPool<T> {
        self.inner.into_inner()
    }

    pub fn borrow(&self) -> PoolResult<Handle> {
        self.inner.lock().borrow()
    }

    pub fn return_object(&self, handle: Handle) -> PoolResult<()> {
        self.inner.lock().return_object(handle)
    }

    pub fn reserve(&self, capacity: usize) -> PoolResult<()> {
        self.inner.lock().reserve(capacity)
    }

    /// Run `f` on a borrowed element while holding the lock.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidHandle`] if the handle is foreign or not currently borrowed.
    pub fn with_object<R>(&self, handle: Handle, f: impl FnOnce(&mut T) -> R) -> PoolResult<R> {
        let mut pool = self.inner.lock();
        let value = pool
            .get_mut(handle)
            .ok_or(PoolError::InvalidHandle { handle })?;
        Ok(f(value))
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn available_count(&self) -> usize {
        self.inner.lock().available_count()
    }

    pub fn borrowed_count(&self) -> usize {
        self.inner.lock().borrowed_count()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.inner.lock().metrics()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn concurrent_borrows_never_alias() {
        let pool = Arc::new(SharedObjectPool::<usize>::new(PoolConfiguration::default()).unwrap());

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let handles: Vec<_> = (0..50).map(|_| pool.borrow().unwrap()).collect();

                    for handle in &handles {
                        pool.with_object(*handle, |value| *value = worker).unwrap();
                    }

                    for handle in &handles {
                        let seen = pool.with_object(*handle, |value| *value).unwrap();
                        assert_eq!(seen, worker);
                    }

                    for handle in handles {
                        pool.return_object(handle).unwrap();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        let metrics = pool.metrics();
        assert_eq!(metrics.total_borrowed, 400);
        assert_eq!(metrics.total_returned, 400);
        assert_eq!(pool.available_count(), pool.capacity());
    }

    #[test]
    fn with_object_rejects_returned_handle() {
        let pool = SharedObjectPool::<u8>::new(PoolConfiguration::default()).unwrap();

        let handle = pool.borrow().unwrap();
        pool.return_object(handle).unwrap();

        assert_eq!(
            pool.with_object(handle, |_| ()),
            Err(PoolError::InvalidHandle { handle })
        );
    }

    #[test]
    fn into_inner_keeps_state() {
        let pool = SharedObjectPool::<u8>::new(PoolConfiguration::new().with_initial_capacity(4)).unwrap();
        let handle = pool.borrow().unwrap();

        let mut inner = pool.into_inner();
        assert!(inner.is_borrowed(handle));
        inner.return_object(handle).unwrap();
    }
}
