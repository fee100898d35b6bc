//! Network profiles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimulatorError;

/// Default spike multiplier range of the built-in profiles.
pub const DEFAULT_SPIKE_MULTIPLIER: (f64, f64) = (5.0, 20.0);

/// Built-in network conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkCondition {
    /// 10 ms base, 5 ms jitter, 0.1% spikes
    Excellent,
    /// 50 ms base, 20 ms jitter, 1% spikes
    #[default]
    Good,
    /// 100 ms base, 50 ms jitter, 5% spikes
    Normal,
    /// 300 ms base, 150 ms jitter, 15% spikes
    Poor,
    /// 1000 ms base, 500 ms jitter, 30% spikes
    Terrible,
}

impl NetworkCondition {
    /// Every condition, best first.
    pub const ALL: [NetworkCondition; 5] = [
        NetworkCondition::Excellent,
        NetworkCondition::Good,
        NetworkCondition::Normal,
        NetworkCondition::Poor,
        NetworkCondition::Terrible,
    ];

    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkCondition::Excellent => "excellent",
            NetworkCondition::Good => "good",
            NetworkCondition::Normal => "normal",
            NetworkCondition::Poor => "poor",
            NetworkCondition::Terrible => "terrible",
        }
    }

    /// Profile for this condition.
    pub fn profile(&self) -> NetworkProfile {
        let (base_ms, jitter_ms, spike_probability) = match self {
            NetworkCondition::Excellent => (10.0, 5.0, 0.001),
            NetworkCondition::Good => (50.0, 20.0, 0.01),
            NetworkCondition::Normal => (100.0, 50.0, 0.05),
            NetworkCondition::Poor => (300.0, 150.0, 0.15),
            NetworkCondition::Terrible => (1000.0, 500.0, 0.30),
        };
        NetworkProfile {
            name: self.as_str().to_string(),
            base_ms,
            jitter_ms,
            spike_probability,
            spike_multiplier_min: DEFAULT_SPIKE_MULTIPLIER.0,
            spike_multiplier_max: DEFAULT_SPIKE_MULTIPLIER.1,
        }
    }
}

impl fmt::Display for NetworkCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkCondition {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(NetworkCondition::Excellent),
            "good" => Ok(NetworkCondition::Good),
            "normal" => Ok(NetworkCondition::Normal),
            "poor" => Ok(NetworkCondition::Poor),
            "terrible" => Ok(NetworkCondition::Terrible),
            _ => Err(SimulatorError::UnknownCondition(s.to_string())),
        }
    }
}

/// Load multiplier for an hour of the day.
///
/// Business hours (09-12, 14-17) are busiest, evenings (20-23) moderately
/// loaded and the small hours (00-06) quiet.
pub fn time_of_day_factor(hour: u32) -> Result<f64, SimulatorError> {
    match hour {
        9..=12 | 14..=17 => Ok(1.5),
        20..=23 => Ok(1.2),
        0..=6 => Ok(0.5),
        7 | 8 | 13 | 18 | 19 => Ok(1.0),
        _ => Err(SimulatorError::InvalidHour(hour)),
    }
}

/// Latency distribution parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Profile name
    pub name: String,
    /// Mean delay in milliseconds
    pub base_ms: f64,
    /// Jitter in milliseconds; the sampled standard deviation is half of it
    pub jitter_ms: f64,
    /// Probability that a sample is a spike
    pub spike_probability: f64,
    /// Smallest spike multiplier
    pub spike_multiplier_min: f64,
    /// Largest spike multiplier
    pub spike_multiplier_max: f64,
}

impl Default for NetworkProfile {
    fn default() -> Self {
        NetworkCondition::default().profile()
    }
}

impl NetworkProfile {
    /// Creates a custom profile with the default spike multiplier range.
    pub fn new(
        name: impl Into<String>,
        base_ms: f64,
        jitter_ms: f64,
        spike_probability: f64,
    ) -> Result<Self, SimulatorError> {
        let profile = Self {
            name: name.into(),
            base_ms,
            jitter_ms,
            spike_probability,
            spike_multiplier_min: DEFAULT_SPIKE_MULTIPLIER.0,
            spike_multiplier_max: DEFAULT_SPIKE_MULTIPLIER.1,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Sets the spike multiplier range.
    pub fn with_spike_multiplier(mut self, min: f64, max: f64) -> Result<Self, SimulatorError> {
        self.spike_multiplier_min = min;
        self.spike_multiplier_max = max;
        self.validate()?;
        Ok(self)
    }

    /// Checks every parameter is in range.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        let invalid = |reason: String| SimulatorError::InvalidProfile {
            name: self.name.clone(),
            reason,
        };
        if !self.base_ms.is_finite() || self.base_ms < 0.0 {
            return Err(invalid(format!("base_ms {} must be >= 0", self.base_ms)));
        }
        if !self.jitter_ms.is_finite() || self.jitter_ms < 0.0 {
            return Err(invalid(format!("jitter_ms {} must be >= 0", self.jitter_ms)));
        }
        if !(0.0..=1.0).contains(&self.spike_probability) {
            return Err(invalid(format!(
                "spike_probability {} must be between 0.0 and 1.0",
                self.spike_probability
            )));
        }
        if !self.spike_multiplier_min.is_finite()
            || self.spike_multiplier_min < 1.0
            || self.spike_multiplier_max < self.spike_multiplier_min
            || !self.spike_multiplier_max.is_finite()
        {
            return Err(invalid(format!(
                "spike multiplier range [{}, {}] must satisfy 1 <= min <= max",
                self.spike_multiplier_min, self.spike_multiplier_max
            )));
        }
        Ok(())
    }

    /// Profile with the base delay scaled by the load at `hour`.
    ///
    /// # Examples
    ///
    /// ```
    /// use credit_simulators::latency::NetworkCondition;
    ///
    /// let busy = NetworkCondition::Normal.profile().for_hour(10).unwrap();
    /// assert_eq!(busy.base_ms, 150.0);
    /// assert!(NetworkCondition::Normal.profile().for_hour(24).is_err());
    /// ```
    pub fn for_hour(&self, hour: u32) -> Result<Self, SimulatorError> {
        let factor = time_of_day_factor(hour)?;
        Ok(Self {
            base_ms: self.base_ms * factor,
            ..self.clone()
        })
    }
}
