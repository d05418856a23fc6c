//! Metrics primitives

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Simple counter metric
#[derive(Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
    name: String,
}

impl Counter {
    pub fn new(name: &str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name: name.to_string(),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Sliding-window histogram (keeps the latest samples for percentile calculation)
#[derive(Clone)]
pub struct Histogram {
    samples: Arc<parking_lot::Mutex<Vec<f64>>>,
    name: String,
    max_samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p99: f64,
}

impl Histogram {
    pub fn new(name: &str) -> Self {
        Self {
            samples: Arc::new(parking_lot::Mutex::new(Vec::with_capacity(1000))),
            name: name.to_string(),
            max_samples: 10000,
        }
    }

    pub fn record(&self, value: f64) {
        let mut samples = self.samples.lock();
        if samples.len() >= self.max_samples {
            samples.remove(0);
        }
        samples.push(value);
    }

    pub fn percentile(&self, p: f64) -> f64 {
        let mut sorted = self.samples.lock().clone();
        if sorted.is_empty() {
            return 0.0;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((sorted.len() as f64) * p / 100.0) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    pub fn mean(&self) -> f64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn summary(&self) -> HistogramSummary {
        HistogramSummary {
            count: self.samples.lock().len(),
            mean: self.mean(),
            p50: self.percentile(50.0),
            p99: self.percentile(99.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
