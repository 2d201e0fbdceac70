//! Error types for the object pool

use thiserror::Error;

use crate::pool::Handle;

/// Why a growth step could not acquire backing storage.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationFailureReason {
    #[error("the allocator could not provide the memory")]
    OutOfMemory,

    #[error("slot count overflows usize")]
    CapacityOverflow,

    #[error("configured maximum capacity of {limit} slots reached")]
    CapacityLimit { limit: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Failed to grow pool by {requested} slots: {reason}")]
    AllocationFailure {
        requested: usize,
        reason: AllocationFailureReason,
    },

    #[error("Handle {handle} does not belong to this pool")]
    InvalidHandle { handle: Handle },

    #[error("Handle {handle} refers to a slot that is already free")]
    DoubleReturn { handle: Handle },

    #[error("Invalid growth configuration: {0}")]
    InvalidGrowthConfiguration(String),
}

pub type PoolResult<T> = Result<T, PoolError>;
