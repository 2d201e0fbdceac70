//! Core object pool implementation

use std::collections::HashMap;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

use crate::config::{GrowthStrategy, PoolConfiguration, ReturnPolicy};
use crate::errors::{AllocationFailureReason, PoolError, PoolResult};
use crate::health::HealthStatus;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};

/// Source of pool identities stamped into every handle, so that a handle
/// presented to the wrong pool is recognized as foreign.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one borrowed element of an [`ObjectPool`].
///
/// Handles are plain tokens: copying one does not borrow anything, and the
/// pool validates every handle it is given. A handle stays meaningful until
/// it is passed to [`ObjectPool::return_object()`]. The slot may then be
/// handed to another borrower, but the old handle carries the slot's previous
/// generation and is rejected from then on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pool_id: u64,
    block: usize,
    offset: usize,
    generation: u32,
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}.{}@{}",
            self.pool_id, self.block, self.offset, self.generation
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Borrowed,
}

struct Slot<T> {
    value: T,
    state: SlotState,

    /// Bumped on every borrow; a handle is current only while it matches.
    generation: u32,
}

impl<T> Slot<T> {
    fn is_held_by(&self, handle: Handle) -> bool {
        self.state == SlotState::Borrowed && self.generation == handle.generation
    }
}

type Factory<T> = Box<dyn FnMut() -> T + Send>;

/// A recycling store of `T` values with stable element addresses.
///
/// Storage is a list of blocks. Each block is a boxed slice allocated once
/// and never moved, resized or freed before the pool itself is dropped, so
/// the address of an element (see [`as_ptr()`][Self::as_ptr]) does not
/// change no matter how much the pool grows afterwards.
///
/// When [`borrow()`][Self::borrow] finds no free slot the pool appends one
/// block sized by its [`GrowthStrategy`]. Capacity never shrinks.
///
/// # Synchronization
///
/// The pool is not internally synchronized. Borrowing and returning take
/// `&mut self`, so sharing one pool between threads requires an external
/// lock such as [`SharedObjectPool`][crate::SharedObjectPool]. Prefer one
/// pool per worker thread where possible.
///
/// # Dropping
///
/// Drop the pool only once no caller still relies on a handle obtained from
/// it. Doing otherwise is memory-safe but the handle's element is gone; the
/// pool logs a warning when dropped with outstanding borrows.
///
/// # Examples
///
/// ```
/// use slot_pool::{GrowthStrategy, ObjectPool, PoolConfiguration};
///
/// let config = PoolConfiguration::new()
///     .with_initial_capacity(2)
///     .with_growth_strategy(GrowthStrategy::exponential());
/// let mut pool = ObjectPool::<[f32; 3]>::new(config).unwrap();
///
/// let a = pool.borrow().unwrap();
/// let b = pool.borrow().unwrap();
/// assert_eq!(pool.available_count(), 0);
///
/// // Exhausted: the third borrow grows the pool.
/// let c = pool.borrow().unwrap();
/// assert!(pool.capacity() >= 4);
///
/// pool.get_mut(c).unwrap()[0] = 1.0;
///
/// for handle in [a, b, c] {
///     pool.return_object(handle).unwrap();
/// }
/// assert_eq!(pool.available_count(), pool.capacity());
/// ```
pub struct ObjectPool<T> {
    id: u64,

    /// Blocks in allocation order. Pushing onto this Vec moves the boxes,
    /// never the slots they point to.
    blocks: Vec<Box<[Slot<T>]>>,

    /// Stack of free slot coordinates; the most recently returned slot is
    /// handed out first. Its allocation always has room for every slot in
    /// the pool, so returning never allocates.
    free: Vec<(usize, usize)>,

    capacity: usize,
    config: PoolConfiguration,
    factory: Factory<T>,
    metrics: MetricsTracker,
}

impl<T: Default + 'static> ObjectPool<T> {
    /// Create a pool whose slots are filled with `T::default()`.
    pub fn new(config: PoolConfiguration) -> PoolResult<Self> {
        Self::with_factory(T::default, config)
    }
}

impl<T> ObjectPool<T> {
    /// Create a pool whose slots are filled by `factory`.
    ///
    /// The factory runs once per slot whenever a block is allocated, and
    /// once per return when the pool uses [`ReturnPolicy::Reset`].
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::{ObjectPool, PoolConfiguration};
    ///
    /// let mut pool = ObjectPool::with_factory(
    ///     || Vec::<u8>::with_capacity(256),
    ///     PoolConfiguration::new().with_initial_capacity(4),
    /// )
    /// .unwrap();
    ///
    /// let handle = pool.borrow().unwrap();
    /// assert!(pool.get(handle).unwrap().capacity() >= 256);
    /// # pool.return_object(handle).unwrap();
    /// ```
    pub fn with_factory<F>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: FnMut() -> T + Send + 'static,
    {
        config.validate()?;

        let mut pool = Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            blocks: Vec::new(),
            free: Vec::new(),
            capacity: 0,
            config,
            factory: Box::new(factory),
            metrics: MetricsTracker::default(),
        };

        if pool.config.initial_capacity > 0 {
            pool.append_block(pool.config.initial_capacity)?;
        }

        debug!(
            pool_id = pool.id,
            capacity = pool.capacity,
            strategy = %pool.config.growth_strategy,
            "created object pool"
        );

        Ok(pool)
    }

    /// Borrow a free element, growing the pool first if none is free.
    ///
    /// The element holds whatever its slot holds: a freshly constructed value
    /// or, under [`ReturnPolicy::Keep`], whatever the previous borrower left.
    ///
    /// # Errors
    ///
    /// [`PoolError::AllocationFailure`] if growth was needed and failed. The
    /// pool's capacity and slot states are left untouched in that case.
    pub fn borrow(&mut self) -> PoolResult<Handle> {
        let (block, offset) = loop {
            if let Some(coords) = self.free.pop() {
                break coords;
            }

            // Every successful growth step adds at least one free slot.
            let required = self.capacity.checked_add(1).ok_or_else(|| {
                self.allocation_failure(1, AllocationFailureReason::CapacityOverflow)
            })?;
            self.grow_to(required)?;
        };

        let slot = &mut self.blocks[block][offset];
        debug_assert_eq!(slot.state, SlotState::Free, "free list held a borrowed slot");
        slot.state = SlotState::Borrowed;
        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;

        self.metrics.total_borrowed += 1;

        let handle = Handle {
            pool_id: self.id,
            block,
            offset,
            generation,
        };
        trace!(pool_id = self.id, %handle, "borrowed");

        Ok(handle)
    }

    /// Borrow a free element behind a guard that returns it when dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::{ObjectPool, PoolConfiguration};
    ///
    /// let mut pool = ObjectPool::<String>::new(PoolConfiguration::default()).unwrap();
    ///
    /// {
    ///     let mut scratch = pool.borrow_scoped().unwrap();
    ///     scratch.push_str("temporary");
    /// }
    ///
    /// assert_eq!(pool.borrowed_count(), 0);
    /// ```
    pub fn borrow_scoped(&mut self) -> PoolResult<PooledObject<'_, T>> {
        let handle = self.borrow()?;
        Ok(PooledObject { pool: self, handle })
    }

    /// Give a borrowed element back to the pool.
    ///
    /// # Errors
    ///
    /// * [`PoolError::InvalidHandle`] if the handle was issued by a different pool.
    /// * [`PoolError::DoubleReturn`] if the handle was already returned, even
    ///   when its slot has since been borrowed again by someone else.
    ///
    /// Neither error changes the pool's slot states.
    pub fn return_object(&mut self, handle: Handle) -> PoolResult<()> {
        match self.slot(handle).map(|slot| slot.is_held_by(handle)) {
            None => return Err(self.reject(PoolError::InvalidHandle { handle })),
            Some(false) => return Err(self.reject(PoolError::DoubleReturn { handle })),
            Some(true) => {}
        }

        let fresh = match self.config.return_policy {
            ReturnPolicy::Keep => None,
            ReturnPolicy::Reset => Some((self.factory)()),
        };

        let slot = &mut self.blocks[handle.block][handle.offset];
        if let Some(value) = fresh {
            slot.value = value;
        }
        slot.state = SlotState::Free;

        self.free.push((handle.block, handle.offset));
        self.metrics.total_returned += 1;
        trace!(pool_id = self.id, %handle, "returned");

        Ok(())
    }

    /// Ensure capacity is at least `capacity`, growing immediately if needed.
    ///
    /// A single block is appended, sized as the larger of the shortfall and
    /// the growth strategy's next step.
    ///
    /// # Errors
    ///
    /// [`PoolError::AllocationFailure`] if the storage cannot be obtained or
    /// the request exceeds the configured maximum capacity.
    pub fn reserve(&mut self, capacity: usize) -> PoolResult<()> {
        if capacity <= self.capacity {
            return Ok(());
        }

        self.grow_to(capacity)
    }

    /// Shared access to a borrowed element. `None` if the handle is foreign
    /// or has already been returned.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slot(handle)
            .filter(|slot| slot.is_held_by(handle))
            .map(|slot| &slot.value)
    }

    /// Exclusive access to a borrowed element. `None` if the handle is
    /// foreign or has already been returned.
    #[must_use]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slot_mut(handle)
            .filter(|slot| slot.is_held_by(handle))
            .map(|slot| &mut slot.value)
    }

    /// Address of a borrowed element. The address is the same for the whole
    /// life of the pool, regardless of later growth.
    #[must_use]
    pub fn as_ptr(&self, handle: Handle) -> Option<*const T> {
        self.get(handle).map(ptr::from_ref)
    }

    /// Whether `handle` refers to a slot of this pool that is currently borrowed.
    #[must_use]
    pub fn is_borrowed(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of free slots.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.free.len()
    }

    /// Number of borrowed slots.
    #[must_use]
    pub fn borrowed_count(&self) -> usize {
        self.capacity - self.free.len()
    }

    /// Number of blocks allocated so far.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The growth strategy fixed at construction.
    #[must_use]
    pub fn growth_strategy(&self) -> GrowthStrategy {
        self.config.growth_strategy
    }

    /// The validated configuration the pool was built with.
    #[must_use]
    pub fn configuration(&self) -> &PoolConfiguration {
        &self.config
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        self.metrics.snapshot(
            self.borrowed_count(),
            self.available_count(),
            self.capacity,
            self.blocks.len(),
        )
    }

    /// Get health status
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_metrics(&self.metrics())
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }

    fn slot(&self, handle: Handle) -> Option<&Slot<T>> {
        if handle.pool_id != self.id {
            return None;
        }

        self.blocks.get(handle.block)?.get(handle.offset)
    }

    fn slot_mut(&mut self, handle: Handle) -> Option<&mut Slot<T>> {
        if handle.pool_id != self.id {
            return None;
        }

        self.blocks.get_mut(handle.block)?.get_mut(handle.offset)
    }

    fn reject(&mut self, err: PoolError) -> PoolError {
        self.metrics.rejected_returns += 1;
        warn!(pool_id = self.id, error = %err, "rejected return");
        err
    }

    fn allocation_failure(&mut self, requested: usize, reason: AllocationFailureReason) -> PoolError {
        self.metrics.allocation_failures += 1;
        let err = PoolError::AllocationFailure { requested, reason };
        warn!(pool_id = self.id, capacity = self.capacity, error = %err, "pool growth failed");
        err
    }

    /// Append one block so that capacity reaches at least `required`.
    fn grow_to(&mut self, required: usize) -> PoolResult<()> {
        let shortfall = required - self.capacity;

        let Some(step) = self
            .config
            .growth_strategy
            .next_block_size(self.capacity, self.config.min_block_size)
        else {
            return Err(self.allocation_failure(shortfall, AllocationFailureReason::CapacityOverflow));
        };

        let mut block_size = step.max(shortfall);

        if let Some(limit) = self.config.max_capacity {
            if required > limit {
                return Err(self.allocation_failure(
                    shortfall,
                    AllocationFailureReason::CapacityLimit { limit },
                ));
            }

            block_size = block_size.min(limit - self.capacity);
        }

        self.append_block(block_size)?;
        self.metrics.growth_events += 1;

        debug!(
            pool_id = self.id,
            block_size,
            capacity = self.capacity,
            strategy = %self.config.growth_strategy,
            "grew object pool"
        );

        Ok(())
    }

    /// Allocate a block of `size` free slots. Everything that can fail
    /// happens before any field of the pool is modified.
    fn append_block(&mut self, size: usize) -> PoolResult<()> {
        let Some(new_capacity) = self.capacity.checked_add(size) else {
            return Err(self.allocation_failure(size, AllocationFailureReason::CapacityOverflow));
        };

        let mut slots: Vec<Slot<T>> = Vec::new();
        let reserved = slots
            .try_reserve_exact(size)
            .and_then(|()| self.blocks.try_reserve(1))
            .and_then(|()| self.free.try_reserve(new_capacity - self.free.len()));

        if reserved.is_err() {
            return Err(self.allocation_failure(size, AllocationFailureReason::OutOfMemory));
        }

        let factory = &mut self.factory;
        slots.extend((0..size).map(|_| Slot {
            value: factory(),
            state: SlotState::Free,
            generation: 0,
        }));

        let block = self.blocks.len();
        self.blocks.push(slots.into_boxed_slice());
        // Reversed so the lowest offset is handed out first.
        self.free.extend((0..size).rev().map(|offset| (block, offset)));
        self.capacity = new_capacity;

        Ok(())
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("item_type", &format_args!("{}", std::any::type_name::<T>()))
            .field("id", &self.id)
            .field("growth_strategy", &format_args!("{}", self.config.growth_strategy))
            .field("capacity", &self.capacity)
            .field("available", &self.available_count())
            .field("blocks", &self.blocks.len())
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl<T> Drop for ObjectPool<T> {
    fn drop(&mut self) {
        let outstanding = self.borrowed_count();
        if outstanding > 0 {
            warn!(
                pool_id = self.id,
                outstanding,
                "object pool dropped while elements were still borrowed"
            );
        }
    }
}

/// A borrowed element that returns itself to its pool when dropped.
///
/// The guard holds the pool exclusively, so only one scoped element can be
/// live per pool at a time. Use [`detach()`][Self::detach] to keep the
/// element borrowed beyond the guard and return it by handle later.
pub struct PooledObject<'a, T> {
    pool: &'a mut ObjectPool<T>,
    handle: Handle,
}

impl<T> PooledObject<'_, T> {
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Release the guard without returning the element. The caller becomes
    /// responsible for passing the handle to [`ObjectPool::return_object()`].
    #[must_use]
    pub fn detach(self) -> Handle {
        let this = ManuallyDrop::new(self);
        this.handle
    }
}

impl<T> Deref for PooledObject<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.pool.blocks[self.handle.block][self.handle.offset].value
    }
}

impl<T> DerefMut for PooledObject<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pool.blocks[self.handle.block][self.handle.offset].value
    }
}

impl<T> Drop for PooledObject<'_, T> {
    fn drop(&mut self) {
        let result = self.pool.return_object(self.handle);
        debug_assert!(result.is_ok(), "scoped element was not borrowed: {result:?}");
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject")
            .field("handle", &self.handle)
            .field("value", &**self)
            .finish()
    }
}
