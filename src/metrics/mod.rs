// Metrics module - Prometheus-compatible metrics tracking
// Provides counters and latency histograms for pipeline stages

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Latency samples kept per stage; older samples are dropped first
pub const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Histogram represents percentile statistics for latency measurements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Histogram {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Histogram {
    fn empty() -> Self {
        Histogram {
            p50: 0.0,
            p90: 0.0,
            p95: 0.0,
            p99: 0.0,
        }
    }
}

/// Metrics struct tracks per-stage counters and latencies for Prometheus export
/// Thread-safe via atomic operations and mutexes
pub struct Metrics {
    // Total stage invocations across all stages
    invocation_count: AtomicU64,

    // Invocations keyed by (stage, outcome), e.g. ("resizer", "resize")
    outcome_counts: Mutex<BTreeMap<(String, String), u64>>,

    // Per-stage latency window (microseconds), at most MAX_LATENCY_SAMPLES each
    stage_latencies: Mutex<HashMap<String, VecDeque<u64>>>,

    // Encoded output bytes produced
    bytes_out: AtomicU64,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Metrics {
            invocation_count: AtomicU64::new(0),
            outcome_counts: Mutex::new(BTreeMap::new()),
            stage_latencies: Mutex::new(HashMap::new()),
            bytes_out: AtomicU64::new(0),
        }
    }

    /// Record one stage invocation with its outcome and duration
    ///
    /// Best-effort: a poisoned lock drops the sample.
    pub fn record_stage(&self, stage: &str, outcome: &str, duration: Duration) {
        self.invocation_count.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut counts) = self.outcome_counts.lock() {
            *counts
                .entry((stage.to_string(), outcome.to_string()))
                .or_insert(0) += 1;
        }

        let duration_us = duration.as_micros() as u64;
        if let Ok(mut latencies) = self.stage_latencies.lock() {
            let samples = latencies.entry(stage.to_string()).or_default();
            if samples.len() >= MAX_LATENCY_SAMPLES {
                samples.pop_front();
            }
            samples.push_back(duration_us);
        }
    }

    /// Add to the encoded output byte counter
    pub fn add_bytes_out(&self, bytes: u64) {
        self.bytes_out.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Total invocations across all stages
    pub fn invocation_count(&self) -> u64 {
        self.invocation_count.load(Ordering::Relaxed)
    }

    /// Invocations of `stage` that ended with `outcome`
    pub fn outcome_count(&self, stage: &str, outcome: &str) -> u64 {
        self.outcome_counts
            .lock()
            .ok()
            .and_then(|counts| {
                counts
                    .get(&(stage.to_string(), outcome.to_string()))
                    .copied()
            })
            .unwrap_or(0)
    }

    /// Total encoded bytes produced
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out.load(Ordering::Relaxed)
    }

    /// Latency samples currently retained for `stage`
    pub fn latency_sample_count(&self, stage: &str) -> usize {
        self.stage_latencies
            .lock()
            .ok()
            .and_then(|latencies| latencies.get(stage).map(VecDeque::len))
            .unwrap_or(0)
    }

    /// Calculate histogram (milliseconds) for a specific stage
    pub fn stage_latency_histogram(&self, stage: &str) -> Histogram {
        if let Ok(latencies) = self.stage_latencies.lock() {
            if let Some(samples) = latencies.get(stage) {
                return calculate_histogram(samples);
            }
        }
        Histogram::empty()
    }

    /// Render all metrics in Prometheus text exposition format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP stage_invocations_total Total number of stage invocations\n");
        output.push_str("# TYPE stage_invocations_total counter\n");
        output.push_str(&format!(
            "stage_invocations_total {}\n",
            self.invocation_count.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP stage_outcomes_total Stage invocations by outcome\n");
        output.push_str("# TYPE stage_outcomes_total counter\n");
        if let Ok(counts) = self.outcome_counts.lock() {
            for ((stage, outcome), count) in counts.iter() {
                output.push_str(&format!(
                    "stage_outcomes_total{{stage=\"{}\",outcome=\"{}\"}} {}\n",
                    stage, outcome, count
                ));
            }
        }

        output.push_str("\n# HELP stage_duration_milliseconds Stage latency percentiles\n");
        output.push_str("# TYPE stage_duration_milliseconds summary\n");
        if let Ok(latencies) = self.stage_latencies.lock() {
            let mut stages: Vec<&String> = latencies.keys().collect();
            stages.sort();
            for stage in stages {
                let histogram = calculate_histogram(&latencies[stage]);
                for (quantile, value) in [
                    ("0.5", histogram.p50),
                    ("0.9", histogram.p90),
                    ("0.95", histogram.p95),
                    ("0.99", histogram.p99),
                ] {
                    output.push_str(&format!(
                        "stage_duration_milliseconds{{stage=\"{}\",quantile=\"{}\"}} {}\n",
                        stage, quantile, value
                    ));
                }
            }
        }

        output.push_str("\n# HELP stage_output_bytes_total Encoded bytes produced\n");
        output.push_str("# TYPE stage_output_bytes_total counter\n");
        output.push_str(&format!(
            "stage_output_bytes_total {}\n",
            self.bytes_out.load(Ordering::Relaxed)
        ));

        output
    }
}

fn calculate_histogram(samples: &VecDeque<u64>) -> Histogram {
    if samples.is_empty() {
        return Histogram::empty();
    }

    let mut sorted: Vec<u64> = samples.iter().copied().collect();
    sorted.sort_unstable();

    let p50_idx = (sorted.len() as f64 * 0.50) as usize;
    let p90_idx = (sorted.len() as f64 * 0.90) as usize;
    let p95_idx = (sorted.len() as f64 * 0.95) as usize;
    let p99_idx = (sorted.len() as f64 * 0.99) as usize;

    // Convert from microseconds to milliseconds
    Histogram {
        p50: sorted.get(p50_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
        p90: sorted.get(p90_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
        p95: sorted.get(p95_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
        p99: sorted.get(p99_idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0,
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
