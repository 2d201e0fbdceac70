//! Property tests for borrow/return/growth invariants.

use std::collections::HashSet;

use proptest::prelude::*;
use slot_pool::{GrowthStrategy, Handle, ObjectPool, PoolConfiguration, PoolError};

#[derive(Debug, Clone)]
enum Op {
    Borrow,
    /// Return the outstanding handle at this position (modulo count).
    Return(usize),
    Reserve(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Borrow),
        3 => any::<usize>().prop_map(Op::Return),
        1 => (0usize..200).prop_map(Op::Reserve),
    ]
}

fn strategy() -> impl Strategy<Value = GrowthStrategy> {
    prop_oneof![
        (1usize..16).prop_map(|increment| GrowthStrategy::Linear { increment }),
        (2usize..4).prop_map(|multiplier| GrowthStrategy::Exponential { multiplier }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_for_any_operation_sequence(
        initial_capacity in 0usize..8,
        growth in strategy(),
        ops in proptest::collection::vec(op(), 1..200),
    ) {
        let config = PoolConfiguration::new()
            .with_initial_capacity(initial_capacity)
            .with_growth_strategy(growth);
        let mut pool = ObjectPool::<u64>::new(config).unwrap();

        let mut outstanding: Vec<(Handle, *const u64)> = Vec::new();
        let mut last_capacity = pool.capacity();

        for op in ops {
            match op {
                Op::Borrow => {
                    let handle = pool.borrow().unwrap();
                    let address = pool.as_ptr(handle).unwrap();
                    outstanding.push((handle, address));
                }
                Op::Return(index) if !outstanding.is_empty() => {
                    let (handle, _) = outstanding.swap_remove(index % outstanding.len());
                    pool.return_object(handle).unwrap();
                }
                Op::Return(_) => {}
                Op::Reserve(n) => {
                    pool.reserve(n).unwrap();
                    prop_assert!(pool.capacity() >= n);
                }
            }

            // Capacity never decreases.
            prop_assert!(pool.capacity() >= last_capacity);
            last_capacity = pool.capacity();

            prop_assert_eq!(pool.borrowed_count(), outstanding.len());
            prop_assert_eq!(pool.available_count() + pool.borrowed_count(), pool.capacity());

            // Outstanding elements keep their address and never share a slot.
            let mut seen = HashSet::new();
            for (handle, address) in &outstanding {
                prop_assert_eq!(pool.as_ptr(*handle), Some(*address));
                prop_assert!(seen.insert(*address));
            }
        }
    }

    #[test]
    fn borrow_then_return_restores_available_count(
        initial_capacity in 1usize..32,
        pre_borrowed in 0usize..32,
    ) {
        let pre_borrowed = pre_borrowed % initial_capacity;
        let mut pool = ObjectPool::<u8>::new(
            PoolConfiguration::new().with_initial_capacity(initial_capacity),
        )
        .unwrap();

        for _ in 0..pre_borrowed {
            _ = pool.borrow().unwrap();
        }

        let available = pool.available_count();
        let capacity = pool.capacity();

        let handle = pool.borrow().unwrap();
        pool.return_object(handle).unwrap();

        prop_assert_eq!(pool.available_count(), available);
        prop_assert_eq!(pool.capacity(), capacity);
    }

    #[test]
    fn linear_growth_adds_exactly_one_increment(
        initial_capacity in 0usize..64,
        increment in 1usize..64,
    ) {
        let config = PoolConfiguration::new()
            .with_initial_capacity(initial_capacity)
            .with_growth_strategy(GrowthStrategy::Linear { increment });
        let mut pool = ObjectPool::<u32>::new(config).unwrap();

        for _ in 0..initial_capacity {
            _ = pool.borrow().unwrap();
        }
        prop_assert_eq!(pool.available_count(), 0);

        let handle = pool.borrow().unwrap();
        prop_assert!(pool.is_borrowed(handle));
        prop_assert_eq!(pool.capacity(), initial_capacity + increment);
    }

    #[test]
    fn exponential_growth_at_least_multiplies(
        initial_capacity in 1usize..64,
        multiplier in 2usize..5,
    ) {
        let config = PoolConfiguration::new()
            .with_initial_capacity(initial_capacity)
            .with_growth_strategy(GrowthStrategy::Exponential { multiplier });
        let mut pool = ObjectPool::<u32>::new(config).unwrap();

        for _ in 0..=initial_capacity {
            _ = pool.borrow().unwrap();
        }

        prop_assert!(pool.capacity() >= initial_capacity * multiplier);
    }

    #[test]
    fn non_positive_parameter_is_rejected(
        kind in prop_oneof![Just("linear"), Just("exponential")],
        parameter in i64::MIN..=0,
    ) {
        let result = PoolConfiguration::from_parts(4, kind, parameter);
        prop_assert!(matches!(result, Err(PoolError::InvalidGrowthConfiguration(_))));
    }
}

#[test]
fn handles_from_another_pool_are_rejected() {
    let mut first = ObjectPool::<u8>::new(PoolConfiguration::new().with_initial_capacity(4)).unwrap();
    let mut second = ObjectPool::<u8>::new(PoolConfiguration::new().with_initial_capacity(4)).unwrap();

    // Same coordinates in both pools; only identity tells them apart.
    let from_first = first.borrow().unwrap();
    let from_second = second.borrow().unwrap();
    assert_ne!(from_first, from_second);

    assert_eq!(
        second.return_object(from_first),
        Err(PoolError::InvalidHandle { handle: from_first })
    );
    assert!(second.is_borrowed(from_second));

    first.return_object(from_first).unwrap();
    second.return_object(from_second).unwrap();
}
