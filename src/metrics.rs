//! In-process prediction statistics.

use crate::error::{FailureKind, PredictionError};
use crate::types::property::TargetProperty;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

/// Samples kept per property for latency statistics
const MAX_LATENCY_SAMPLES: usize = 1000;

/// Request counters and inference latencies
pub struct PredictionMetrics {
    requests: AtomicU64,
    successes: AtomicU64,
    failures_by_kind: RwLock<HashMap<FailureKind, u64>>,
    requests_by_property: RwLock<HashMap<TargetProperty, u64>>,
    /// Latencies of successful predictions, in microseconds
    latencies: RwLock<HashMap<TargetProperty, Vec<u64>>>,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            requests_by_property: RwLock::new(HashMap::new()),
            latencies: RwLock::new(HashMap::new()),
        }
    }

    /// Record the outcome of one request
    pub fn record(&self, property: TargetProperty, result: &Result<f64, PredictionError>, elapsed: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_property) = self.requests_by_property.write() {
            *by_property.entry(property).or_insert(0) += 1;
        }

        match result {
            Ok(_) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut latencies) = self.latencies.write() {
                    let samples = latencies.entry(property).or_default();
                    samples.push(elapsed.as_micros() as u64);
                    // Keep only the most recent samples
                    if samples.len() > MAX_LATENCY_SAMPLES {
                        samples.drain(0..MAX_LATENCY_SAMPLES / 2);
                    }
                }
            }
            Err(e) => {
                if let Ok(mut failures) = self.failures_by_kind.write() {
                    *failures.entry(e.kind()).or_insert(0) += 1;
                }
            }
        }
    }

    /// Snapshot of the counters
    pub fn summary(&self) -> MetricsSummary {
        let latency: HashMap<TargetProperty, LatencyStats> = self
            .latencies
            .read()
            .map(|latencies| {
                latencies
                    .iter()
                    .filter_map(|(property, samples)| LatencyStats::from_samples(samples).map(|s| (*property, s)))
                    .collect()
            })
            .unwrap_or_default();

        MetricsSummary {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures_by_kind: self
                .failures_by_kind
                .read()
                .map(|f| f.clone())
                .unwrap_or_default(),
            requests_by_property: self
                .requests_by_property
                .read()
                .map(|r| r.clone())
                .unwrap_or_default(),
            latency,
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let summary = self.summary();
        let failures = summary.requests - summary.successes;

        info!(
            requests = summary.requests,
            successes = summary.successes,
            failures = failures,
            "Prediction summary"
        );

        for (kind, count) in &summary.failures_by_kind {
            info!(kind = kind.as_str(), count = *count, "Failures by kind");
        }

        for property in TargetProperty::ALL {
            let requests = summary.requests_by_property.get(&property).copied().unwrap_or(0);
            match summary.latency.get(&property) {
                Some(stats) => info!(
                    property = %property,
                    requests = requests,
                    mean_us = stats.mean_us,
                    p50_us = stats.p50_us,
                    max_us = stats.max_us,
                    "Property statistics"
                ),
                None => info!(property = %property, requests = requests, "Property statistics"),
            }
        }
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub requests: u64,
    pub successes: u64,
    pub failures_by_kind: HashMap<FailureKind, u64>,
    pub requests_by_property: HashMap<TargetProperty, u64>,
    pub latency: HashMap<TargetProperty, LatencyStats>,
}

/// Inference latency statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub max_us: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let count = sorted.len();

        Some(Self {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: sorted[count / 2],
            max_us: sorted[count - 1],
        })
    }
}
