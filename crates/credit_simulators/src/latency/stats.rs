//! Running latency statistics.

use serde::Serialize;
use std::collections::VecDeque;

use super::simulator::LatencySample;

/// Number of recent samples kept for the median.
pub const DEFAULT_RESERVOIR: usize = 1_024;

/// Snapshot of latency statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    /// Samples observed
    pub count: u64,
    /// Mean delay over every sample
    pub mean_ms: f64,
    /// Median over the recent reservoir
    pub median_ms: f64,
    /// Smallest delay
    pub min_ms: f64,
    /// Largest delay
    pub max_ms: f64,
    /// Sample standard deviation over every sample
    pub stddev_ms: f64,
    /// Spiked samples
    pub spike_count: u64,
    /// Fraction of samples that spiked
    pub spike_rate: f64,
}

/// Accumulates samples in constant memory apart from a bounded reservoir.
#[derive(Debug, Clone)]
pub struct LatencyRecorder {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    spikes: u64,
    recent: VecDeque<f64>,
    capacity: usize,
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::with_reservoir(DEFAULT_RESERVOIR)
    }
}

impl LatencyRecorder {
    /// Creates a recorder keeping at most `capacity` recent samples (min 1).
    pub fn with_reservoir(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            spikes: 0,
            recent: VecDeque::with_capacity(capacity.min(DEFAULT_RESERVOIR)),
            capacity,
        }
    }

    /// Records one sample.
    pub fn record(&mut self, sample: &LatencySample) {
        let x = sample.delay_ms;
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        if sample.spiked {
            self.spikes += 1;
        }

        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(x);
    }

    /// Samples recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Clears all samples.
    pub fn reset(&mut self) {
        *self = Self::with_reservoir(self.capacity);
    }

    /// Current statistics; all zero before the first sample.
    pub fn snapshot(&self) -> LatencyStats {
        if self.count == 0 {
            return LatencyStats::default();
        }
        let stddev = if self.count > 1 {
            (self.m2 / (self.count - 1) as f64).sqrt()
        } else {
            0.0
        };
        LatencyStats {
            count: self.count,
            mean_ms: self.mean,
            median_ms: median(&self.recent),
            min_ms: self.min,
            max_ms: self.max,
            stddev_ms: stddev,
            spike_count: self.spikes,
            spike_rate: self.spikes as f64 / self.count as f64,
        }
    }
}

fn median(values: &VecDeque<f64>) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
