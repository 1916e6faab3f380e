//! Prometheus registry wrapper shared by the poller and the exposition endpoint
//!
//! Every instrument is created through [`MetricsRegistry`] so that it carries
//! the configured namespace and ends up in the same text exposition.

use prometheus::{Counter, CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::Mutex;

use crate::error::{ExporterError, Result};

/// Metrics registry for the exporter
pub struct MetricsRegistry {
    /// Prometheus registry
    registry: Registry,
    /// Namespace prefixed to every metric name
    namespace: String,
}

impl MetricsRegistry {
    /// Create a new registry whose metrics live under `namespace`
    pub fn new(namespace: &str) -> Self {
        Self {
            registry: Registry::new(),
            namespace: namespace.to_string(),
        }
    }

    /// Namespace of this registry
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full name a metric is published under
    pub fn qualified_name(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.namespace, name)
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExporterError::Serialization(e.to_string()))
    }

    fn opts(&self, name: &str, help: &str) -> Opts {
        Opts::new(name, help).namespace(self.namespace.clone())
    }

    /// Create a new float gauge vector
    pub fn create_gauge_vec(&self, name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec> {
        let gauge_vec = GaugeVec::new(self.opts(name, help), labels)?;
        self.registry.register(Box::new(gauge_vec.clone()))?;
        Ok(gauge_vec)
    }

    /// Create a new counter vector whose values can be set absolutely
    pub fn create_settable_counter_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<SettableCounterVec> {
        let counter_vec = CounterVec::new(self.opts(name, help), labels)?;
        self.registry.register(Box::new(counter_vec.clone()))?;
        Ok(SettableCounterVec {
            inner: counter_vec,
            write_lock: Mutex::new(()),
        })
    }
}

/// Counter vector that mirrors an externally maintained total.
///
/// Prometheus counters only go up, so an absolute value is applied as an
/// increment by the difference from the current value. A value below the
/// current one (the source restarted its count) resets the series first.
/// A counter cannot hold a negative value, so negative totals are stored
/// as zero.
/// Sets are serialized because reading the current value and incrementing
/// it are two separate operations.
pub struct SettableCounterVec {
    inner: CounterVec,
    write_lock: Mutex<()>,
}

impl SettableCounterVec {
    /// Set the counter for `label_values` to `value`
    pub fn set(&self, label_values: &[&str], value: f64) -> Result<()> {
        let counter = self.inner.get_metric_with_label_values(label_values)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        apply_absolute(&counter, value);
        Ok(())
    }

    /// Current value for `label_values`
    pub fn get(&self, label_values: &[&str]) -> Result<f64> {
        Ok(self.inner.get_metric_with_label_values(label_values)?.get())
    }
}

fn apply_absolute(counter: &Counter, value: f64) {
    let current = counter.get();
    if value >= current {
        counter.inc_by(value - current);
    } else {
        counter.reset();
        if value > 0.0 {
            counter.inc_by(value);
        }
    }
}
