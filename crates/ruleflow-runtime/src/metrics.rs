//! Metrics collection and reporting
//!
//! The runtime emits named counters, gauges, and timing histograms here;
//! aggregation and display belong to an external metrics component.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Counter metric
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter
    pub fn inc(&self) {
        self.add(1);
    }

    /// Add a value to the counter
    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    /// Get the current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Reset the counter
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Gauge metric for point-in-time values (e.g. pool size)
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.set(0);
    }
}

/// Histogram metric for tracking distributions
#[derive(Debug, Default)]
pub struct Histogram {
    values: RwLock<Vec<f64>>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a value
    pub fn observe(&self, value: f64) {
        self.values.write().unwrap().push(value);
    }

    /// Observe a duration in seconds
    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64());
    }

    /// Get count of observations
    pub fn count(&self) -> usize {
        self.values.read().unwrap().len()
    }

    /// Get sum of all values
    pub fn sum(&self) -> f64 {
        self.values.read().unwrap().iter().sum()
    }

    /// Get average value
    pub fn avg(&self) -> f64 {
        let values = self.values.read().unwrap();
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    /// Reset the histogram
    pub fn reset(&self) {
        self.values.write().unwrap().clear();
    }
}

/// Metrics sink trait
pub trait MetricsSink: Send + Sync {
    /// Get or create a counter
    fn counter(&self, name: &str) -> Arc<Counter>;

    /// Get or create a gauge
    fn gauge(&self, name: &str) -> Arc<Gauge>;

    /// Get or create a histogram
    fn histogram(&self, name: &str) -> Arc<Histogram>;

    /// Record execution time
    fn record_execution_time(&self, operation: &str, duration: Duration);

    /// Record error
    fn record_error(&self, error_type: &str);
}

/// Metrics collector
#[derive(Default)]
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
    gauges: RwLock<HashMap<String, Arc<Gauge>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all counter names
    pub fn counter_names(&self) -> Vec<String> {
        self.counters.read().unwrap().keys().cloned().collect()
    }

    /// Get all histogram names
    pub fn histogram_names(&self) -> Vec<String> {
        self.histograms.read().unwrap().keys().cloned().collect()
    }

    /// Reset all metrics
    pub fn reset_all(&self) {
        for counter in self.counters.read().unwrap().values() {
            counter.reset();
        }
        for gauge in self.gauges.read().unwrap().values() {
            gauge.reset();
        }
        for histogram in self.histograms.read().unwrap().values() {
            histogram.reset();
        }
    }
}

impl MetricsSink for MetricsCollector {
    fn counter(&self, name: &str) -> Arc<Counter> {
        self.counters
            .write()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Counter::new()))
            .clone()
    }

    fn gauge(&self, name: &str) -> Arc<Gauge> {
        self.gauges
            .write()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Gauge::new()))
            .clone()
    }

    fn histogram(&self, name: &str) -> Arc<Histogram> {
        self.histograms
            .write()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Histogram::new()))
            .clone()
    }

    fn record_execution_time(&self, operation: &str, duration: Duration) {
        let hist = self.histogram(&format!("{}_duration", operation));
        hist.observe_duration(duration);
    }

    fn record_error(&self, error_type: &str) {
        let counter = self.counter(&format!("errors_{}", error_type));
        counter.inc();
    }
}
