//! Delay sampling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::time::Duration;

use super::profile::NetworkProfile;
use super::stats::{LatencyRecorder, LatencyStats};
use crate::error::SimulatorError;

/// One sampled delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    /// Delay in milliseconds, never negative
    pub delay_ms: f64,
    /// Whether a spike multiplier was applied
    pub spiked: bool,
}

impl LatencySample {
    /// Wall-clock wait for this sample at `time_scale`.
    pub fn pacing(&self, time_scale: f64) -> Duration {
        pacing(self.delay_ms, time_scale)
    }
}

/// Converts a simulated delay into a wall-clock wait.
///
/// A scale of 1.0 waits in real time and 0.0 does not wait at all. Negative
/// or non-finite inputs produce no wait.
///
/// # Examples
///
/// ```
/// use credit_simulators::latency::pacing;
/// use std::time::Duration;
///
/// assert_eq!(pacing(250.0, 1.0), Duration::from_millis(250));
/// assert_eq!(pacing(250.0, 0.0), Duration::ZERO);
/// ```
pub fn pacing(delay_ms: f64, time_scale: f64) -> Duration {
    let millis = delay_ms * time_scale;
    if millis.is_finite() && millis > 0.0 {
        Duration::from_nanos((millis * 1_000_000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

/// Samples delays from a network profile.
///
/// Each sample is `max(0, Normal(base, jitter / 2))`, multiplied by a
/// uniform draw from the spike range with the profile's spike probability.
#[derive(Debug, Clone)]
pub struct LatencySimulator {
    profile: NetworkProfile,
    normal: Normal<f64>,
    rng: StdRng,
    recorder: LatencyRecorder,
}

impl LatencySimulator {
    /// Creates a simulator with an entropy-seeded random source.
    pub fn new(profile: NetworkProfile) -> Result<Self, SimulatorError> {
        profile.validate()?;
        let normal = Normal::new(profile.base_ms, profile.jitter_ms / 2.0).map_err(|e| {
            SimulatorError::InvalidProfile {
                name: profile.name.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            profile,
            normal,
            rng: StdRng::from_entropy(),
            recorder: LatencyRecorder::default(),
        })
    }

    /// Reseeds the random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Uses `rng` as the random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Keeps at most `capacity` recent samples for the median.
    pub fn with_reservoir(mut self, capacity: usize) -> Self {
        self.recorder = LatencyRecorder::with_reservoir(capacity);
        self
    }

    /// Active profile.
    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    /// Draws the next delay and records it.
    pub fn sample_delay(&mut self) -> LatencySample {
        let sample = self.draw_delay();
        self.record(&sample);
        sample
    }

    /// Draws the next delay without recording it.
    pub fn draw_delay(&mut self) -> LatencySample {
        let mut delay_ms = self.normal.sample(&mut self.rng).max(0.0);
        let spiked = self.rng.gen_bool(self.profile.spike_probability);
        if spiked {
            let multiplier = if self.profile.spike_multiplier_max > self.profile.spike_multiplier_min
            {
                self.rng
                    .gen_range(self.profile.spike_multiplier_min..self.profile.spike_multiplier_max)
            } else {
                self.profile.spike_multiplier_min
            };
            delay_ms *= multiplier;
        }

        LatencySample { delay_ms, spiked }
    }

    /// Adds a drawn sample to the statistics.
    pub fn record(&mut self, sample: &LatencySample) {
        self.recorder.record(sample);
    }

    /// Statistics over every sample drawn so far.
    pub fn stats(&self) -> LatencyStats {
        self.recorder.snapshot()
    }

    /// Clears the statistics.
    pub fn reset_stats(&mut self) {
        self.recorder.reset();
    }
}
