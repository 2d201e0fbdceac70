//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::fmt::Write as _;

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use slot_pool::{ObjectPool, PoolConfiguration};
///
/// let mut pool = ObjectPool::<u32>::new(PoolConfiguration::new().with_initial_capacity(3)).unwrap();
///
/// let handle = pool.borrow().unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_borrowed, 1);
/// assert_eq!(metrics.borrowed_objects, 1);
/// assert_eq!(metrics.capacity, 3);
/// # pool.return_object(handle).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolMetrics {
    /// Total successful borrows
    pub total_borrowed: u64,

    /// Total successful returns
    pub total_returned: u64,

    /// Slots currently borrowed
    pub borrowed_objects: usize,

    /// Slots currently free
    pub available_objects: usize,

    /// Total slots across all blocks
    pub capacity: usize,

    /// Number of blocks allocated
    pub block_count: usize,

    /// Number of times the pool appended a block
    pub growth_events: u64,

    /// Returns rejected as foreign handles or double returns
    pub rejected_returns: u64,

    /// Growth attempts that could not get storage
    pub allocation_failures: u64,

    /// Borrowed share of capacity (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_borrowed".to_string(), self.total_borrowed.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("borrowed_objects".to_string(), self.borrowed_objects.to_string());
        metrics.insert("available_objects".to_string(), self.available_objects.to_string());
        metrics.insert("capacity".to_string(), self.capacity.to_string());
        metrics.insert("block_count".to_string(), self.block_count.to_string());
        metrics.insert("growth_events".to_string(), self.growth_events.to_string());
        metrics.insert("rejected_returns".to_string(), self.rejected_returns.to_string());
        metrics.insert("allocation_failures".to_string(), self.allocation_failures.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::{ObjectPool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = ObjectPool::<u8>::new(PoolConfiguration::new().with_initial_capacity(4)).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("stage".to_string(), "colormap".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("pixels", Some(&tags));
    /// assert!(output.contains("slotpool_capacity{pool=\"pixels\",stage=\"colormap\"} 4"));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        let gauges: [(&str, &str, String); 5] = [
            ("slotpool_objects_borrowed", "Slots currently borrowed", metrics.borrowed_objects.to_string()),
            ("slotpool_objects_available", "Slots currently free", metrics.available_objects.to_string()),
            ("slotpool_capacity", "Total slots across all blocks", metrics.capacity.to_string()),
            ("slotpool_blocks", "Blocks allocated", metrics.block_count.to_string()),
            ("slotpool_utilization", "Borrowed share of capacity", format!("{:.2}", metrics.utilization)),
        ];

        let counters: [(&str, &str, u64); 5] = [
            ("slotpool_borrows_total", "Total successful borrows", metrics.total_borrowed),
            ("slotpool_returns_total", "Total successful returns", metrics.total_returned),
            ("slotpool_growth_events_total", "Blocks appended on demand or by reserve", metrics.growth_events),
            ("slotpool_rejected_returns_total", "Returns rejected as invalid or double", metrics.rejected_returns),
            ("slotpool_allocation_failures_total", "Growth attempts that failed", metrics.allocation_failures),
        ];

        for (name, help, value) in gauges {
            Self::write_metric(&mut output, name, help, "gauge", &labels, &value);
        }

        for (name, help, value) in counters {
            Self::write_metric(&mut output, name, help, "counter", &labels, &value.to_string());
        }

        output
    }

    fn write_metric(output: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: &str) {
        // Writing into a String cannot fail.
        let _ = writeln!(output, "# HELP {name} {help}");
        let _ = writeln!(output, "# TYPE {name} {kind}");
        let _ = writeln!(output, "{name}{{{labels}}} {value}");
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", Self::escape_label_value(pool_name))];

        if let Some(tags) = tags {
            let mut sorted: Vec<_> = tags.iter().collect();
            sorted.sort();
            for (key, value) in sorted {
                labels.push(format!("{}=\"{}\"", key, Self::escape_label_value(value)));
            }
        }

        labels.join(",")
    }

    /// Label values may not contain raw backslashes, quotes or newlines.
    fn escape_label_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                c => escaped.push(c),
            }
        }
        escaped
    }
}

/// Counters maintained by the pool itself.
#[derive(Debug, Default, Clone)]
pub(crate) struct MetricsTracker {
    pub total_borrowed: u64,
    pub total_returned: u64,
    pub growth_events: u64,
    pub rejected_returns: u64,
    pub allocation_failures: u64,
}

impl MetricsTracker {
    pub fn snapshot(
        &self,
        borrowed: usize,
        available: usize,
        capacity: usize,
        block_count: usize,
    ) -> PoolMetrics {
        let utilization = if capacity > 0 {
            borrowed as f64 / capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_borrowed: self.total_borrowed,
            total_returned: self.total_returned,
            borrowed_objects: borrowed,
            available_objects: available,
            capacity,
            block_count,
            growth_events: self.growth_events,
            rejected_returns: self.rejected_returns,
            allocation_failures: self.allocation_failures,
            utilization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_of_empty_pool_is_zero() {
        let metrics = MetricsTracker::default().snapshot(0, 0, 0, 0);
        assert_eq!(metrics.utilization, 0.0);
    }

    #[test]
    fn export_contains_every_counter() {
        let tracker = MetricsTracker {
            total_borrowed: 7,
            total_returned: 5,
            growth_events: 2,
            rejected_returns: 1,
            allocation_failures: 0,
        };
        let exported = tracker.snapshot(2, 6, 8, 2).export();

        assert_eq!(exported["total_borrowed"], "7");
        assert_eq!(exported["total_returned"], "5");
        assert_eq!(exported["growth_events"], "2");
        assert_eq!(exported["rejected_returns"], "1");
        assert_eq!(exported["utilization"], "0.25");
        assert_eq!(exported.len(), 10);
    }

    #[test]
    fn prometheus_label_values_are_escaped() {
        let metrics = MetricsTracker::default().snapshot(0, 1, 1, 1);
        let mut tags = HashMap::new();
        tags.insert("path".to_string(), "C:\\tmp \"x\"\nnext".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "p\"q", Some(&tags));
        assert!(output.contains(r#"slotpool_capacity{pool="p\"q",path="C:\\tmp \"x\"\nnext"} 1"#));
        assert_eq!(output.lines().count(), 30);
    }

    #[test]
    fn prometheus_labels_are_sorted() {
        let metrics = MetricsTracker::default().snapshot(0, 1, 1, 1);
        let mut tags = HashMap::new();
        tags.insert("b".to_string(), "2".to_string());
        tags.insert("a".to_string(), "1".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "p", Some(&tags));
        assert!(output.contains("slotpool_capacity{pool=\"p\",a=\"1\",b=\"2\"} 1\n"));
        assert!(output.contains("# TYPE slotpool_borrows_total counter\n"));
    }
}
