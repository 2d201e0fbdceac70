//! Pool configuration options

use std::fmt;
use std::str::FromStr;

use crate::errors::{PoolError, PoolResult};

/// How much capacity the pool adds when a borrow finds no free slot.
///
/// The strategy is fixed when the pool is built. Any value outside the two
/// cases below is rejected at construction time with
/// [`PoolError::InvalidGrowthConfiguration`].
///
/// # Examples
///
/// ```
/// use slot_pool::GrowthStrategy;
///
/// let strategy: GrowthStrategy = "linear".parse().unwrap();
/// assert_eq!(strategy, GrowthStrategy::Linear { increment: 1024 });
/// assert_eq!(strategy.to_string(), "linear growth");
///
/// assert!("quadratic".parse::<GrowthStrategy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GrowthStrategy {
    /// Append a block of `increment` slots.
    Linear { increment: usize },

    /// Append a block that brings total capacity to `capacity * multiplier`.
    Exponential { multiplier: usize },
}

impl GrowthStrategy {
    pub const DEFAULT_LINEAR_INCREMENT: usize = 1024;
    pub const DEFAULT_MULTIPLIER: usize = 2;

    /// Linear growth with the default increment.
    pub const fn linear() -> Self {
        Self::Linear {
            increment: Self::DEFAULT_LINEAR_INCREMENT,
        }
    }

    /// Exponential growth with the default (doubling) multiplier.
    pub const fn exponential() -> Self {
        Self::Exponential {
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }

    /// Builds a strategy from a strategy name and a raw parameter, as read
    /// from configuration text.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::{GrowthStrategy, PoolError};
    ///
    /// let strategy = GrowthStrategy::from_parts("exponential", 3).unwrap();
    /// assert_eq!(strategy, GrowthStrategy::Exponential { multiplier: 3 });
    ///
    /// let err = GrowthStrategy::from_parts("linear", 0).unwrap_err();
    /// assert!(matches!(err, PoolError::InvalidGrowthConfiguration(_)));
    /// ```
    pub fn from_parts(kind: &str, parameter: i64) -> PoolResult<Self> {
        if parameter <= 0 {
            return Err(PoolError::InvalidGrowthConfiguration(format!(
                "growth parameter must be positive, got {parameter}"
            )));
        }

        let parameter = usize::try_from(parameter).map_err(|_| {
            PoolError::InvalidGrowthConfiguration(format!(
                "growth parameter {parameter} does not fit in usize"
            ))
        })?;

        let strategy = match kind.parse::<Self>()? {
            Self::Linear { .. } => Self::Linear {
                increment: parameter,
            },
            Self::Exponential { .. } => Self::Exponential {
                multiplier: parameter,
            },
        };

        strategy.validate()?;
        Ok(strategy)
    }

    /// Checks the strategy parameter is usable.
    pub fn validate(&self) -> PoolResult<()> {
        match *self {
            Self::Linear { increment: 0 } => Err(PoolError::InvalidGrowthConfiguration(
                "linear increment must be at least 1".to_string(),
            )),
            Self::Exponential { multiplier } if multiplier < 2 => {
                Err(PoolError::InvalidGrowthConfiguration(format!(
                    "exponential multiplier must be at least 2, got {multiplier}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Size of the next block to append to a pool currently holding
    /// `capacity` slots. `None` if the arithmetic overflows.
    pub(crate) fn next_block_size(&self, capacity: usize, min_block_size: usize) -> Option<usize> {
        match *self {
            Self::Linear { increment } => Some(increment),
            Self::Exponential { multiplier } => {
                let target = capacity.checked_mul(multiplier)?;
                Some((target - capacity).max(min_block_size))
            }
        }
    }
}

impl Default for GrowthStrategy {
    fn default() -> Self {
        Self::exponential()
    }
}

impl fmt::Display for GrowthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear { .. } => f.write_str("linear growth"),
            Self::Exponential { .. } => f.write_str("exponential growth"),
        }
    }
}

impl FromStr for GrowthStrategy {
    type Err = PoolError;

    /// Parses a strategy name into that strategy with its default parameter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "");

        match normalized.as_str() {
            "linear" | "lineargrowth" => Ok(Self::linear()),
            "exponential" | "exponentialgrowth" => Ok(Self::exponential()),
            _ => Err(PoolError::InvalidGrowthConfiguration(format!(
                "unknown growth strategy {s:?}"
            ))),
        }
    }
}

/// What happens to an element's contents when it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReturnPolicy {
    /// Leave the element as the borrower left it. The next borrower must
    /// not assume anything about its contents.
    #[default]
    Keep,

    /// Replace the element with a freshly constructed value before it
    /// becomes available again.
    Reset,
}

/// Configuration for object pool behavior
///
/// # Examples
///
/// ```
/// use slot_pool::{GrowthStrategy, PoolConfiguration, ReturnPolicy};
///
/// let config = PoolConfiguration::new()
///     .with_initial_capacity(64)
///     .with_growth_strategy(GrowthStrategy::Linear { increment: 32 })
///     .with_max_capacity(1024)
///     .with_return_policy(ReturnPolicy::Reset);
///
/// assert_eq!(config.initial_capacity, 64);
/// assert_eq!(config.max_capacity, Some(1024));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfiguration {
    /// Number of slots allocated when the pool is built
    pub initial_capacity: usize,

    /// Growth policy applied when the pool is exhausted
    pub growth_strategy: GrowthStrategy,

    /// Smallest block exponential growth will append
    pub min_block_size: usize,

    /// Upper bound on total capacity
    pub max_capacity: Option<usize>,

    /// Content handling for returned elements
    pub return_policy: ReturnPolicy,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            growth_strategy: GrowthStrategy::default(),
            min_block_size: 8,
            max_capacity: None,
            return_policy: ReturnPolicy::Keep,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from the three construction parameters: initial
    /// capacity, strategy name and strategy parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::{GrowthStrategy, PoolConfiguration};
    ///
    /// let config = PoolConfiguration::from_parts(16, "linear", 16).unwrap();
    /// assert_eq!(config.growth_strategy, GrowthStrategy::Linear { increment: 16 });
    ///
    /// assert!(PoolConfiguration::from_parts(16, "exponential", -1).is_err());
    /// ```
    pub fn from_parts(initial_capacity: usize, kind: &str, parameter: i64) -> PoolResult<Self> {
        let config = Self::new()
            .with_initial_capacity(initial_capacity)
            .with_growth_strategy(GrowthStrategy::from_parts(kind, parameter)?);

        config.validate()?;
        Ok(config)
    }

    /// Set the number of slots allocated up front
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the growth strategy
    pub fn with_growth_strategy(mut self, strategy: GrowthStrategy) -> Self {
        self.growth_strategy = strategy;
        self
    }

    /// Set the smallest block exponential growth will append
    pub fn with_min_block_size(mut self, size: usize) -> Self {
        self.min_block_size = size;
        self
    }

    /// Cap the total capacity
    pub fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Set how returned elements are treated
    pub fn with_return_policy(mut self, policy: ReturnPolicy) -> Self {
        self.return_policy = policy;
        self
    }

    /// Checks the configuration is internally consistent.
    pub fn validate(&self) -> PoolResult<()> {
        self.growth_strategy.validate()?;

        if self.min_block_size == 0 {
            return Err(PoolError::InvalidGrowthConfiguration(
                "minimum block size must be at least 1".to_string(),
            ));
        }

        if let Some(max) = self.max_capacity
            && max < self.initial_capacity
        {
            return Err(PoolError::InvalidGrowthConfiguration(format!(
                "maximum capacity {max} is below initial capacity {}",
                self.initial_capacity
            )));
        }

        Ok(())
    }
}
