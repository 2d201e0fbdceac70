//! Health monitoring for object pools

use crate::metrics::PoolMetrics;

/// Utilization above which a pool is reported as unhealthy.
const HIGH_UTILIZATION: f64 = 0.9;

/// Health status of an object pool
///
/// A pool is unhealthy when nearly all of its slots are borrowed or when
/// it has rejected a return, since a rejected return means some caller
/// mishandled a handle.
///
/// # Examples
///
/// ```
/// use slot_pool::{ObjectPool, PoolConfiguration};
///
/// let pool = ObjectPool::<u32>::new(PoolConfiguration::new().with_initial_capacity(3)).unwrap();
///
/// let health = pool.health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.available_objects, 3);
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Current pool utilization (0.0 to 1.0)
    pub utilization: f64,

    /// Available objects count
    pub available_objects: usize,

    /// Borrowed objects count
    pub borrowed_objects: usize,

    /// Total capacity
    pub total_capacity: usize,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Derive a health status from a metrics snapshot
    pub fn from_metrics(metrics: &PoolMetrics) -> Self {
        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if metrics.utilization > HIGH_UTILIZATION {
            warnings.push(format!("High utilization: {:.1}%", metrics.utilization * 100.0));
            is_healthy = false;
        }

        if metrics.rejected_returns > 0 {
            warnings.push(format!(
                "{} return(s) rejected as invalid or double",
                metrics.rejected_returns
            ));
            is_healthy = false;
        }

        if metrics.allocation_failures > 0 {
            warnings.push(format!("{} growth attempt(s) failed", metrics.allocation_failures));
        }

        if metrics.available_objects == 0 && metrics.capacity > 0 {
            warnings.push("Pool is exhausted; next borrow will grow it".to_string());
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization: metrics.utilization,
            available_objects: metrics.available_objects,
            borrowed_objects: metrics.borrowed_objects,
            total_capacity: metrics.capacity,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsTracker;

    #[test]
    fn fully_borrowed_pool_is_unhealthy() {
        let metrics = MetricsTracker::default().snapshot(4, 0, 4, 1);
        let health = HealthStatus::from_metrics(&metrics);

        assert!(!health.is_healthy());
        assert_eq!(health.warning_count, 2);
    }

    #[test]
    fn rejected_return_is_unhealthy() {
        let tracker = MetricsTracker {
            rejected_returns: 1,
            ..MetricsTracker::default()
        };
        let health = HealthStatus::from_metrics(&tracker.snapshot(0, 4, 4, 1));

        assert!(!health.is_healthy());
        assert_eq!(health.warning_count, 1);
    }

    #[test]
    fn empty_pool_is_healthy() {
        let health = HealthStatus::from_metrics(&MetricsTracker::default().snapshot(0, 0, 0, 0));
        assert!(health.is_healthy());
        assert!(health.warnings.is_empty());
    }
}
