//! Producer configuration management.
//!
//! Configuration is read from a TOML file where every field is optional,
//! then overridden from the environment (`CREDIT_SIM_*`, `STREAM_NAME`) and
//! finally from command-line flags. [`ProducerConfig::validate`] reports
//! every problem at once.

use credit_simulators::anomaly::{AnomalyWeights, DEFAULT_ANOMALY_RATE};
use credit_simulators::latency::{NetworkCondition, NetworkProfile};
use credit_simulators::window::DEFAULT_WINDOW_CAPACITY;
use credit_simulators::SimulatorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::engine::RunLimits;
use crate::transport::DEFAULT_STREAM_NAME;

/// Default maximum run time (two hours).
pub const DEFAULT_MAX_DURATION_SECS: u64 = 7_200;

/// Default number of window summaries kept in the run report.
pub const DEFAULT_RETAINED_WINDOWS: usize = 100;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("Cannot read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Parse error in config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation errors
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Dataset section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file path
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/UCI_Credit_Card.csv"),
        }
    }
}

/// Anomaly section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Fraction of events degraded
    pub rate: f64,
    /// Relative weight per kind
    pub weights: AnomalyWeights,
    /// Seed for the injector alone; derived from the run seed when absent
    pub seed: Option<u64>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_ANOMALY_RATE,
            weights: AnomalyWeights::default(),
            seed: None,
        }
    }
}

/// Network section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Built-in profile
    pub profile: NetworkCondition,
    /// Scale the base delay by the load at the current local hour
    pub time_of_day: bool,
}

/// Window section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Events per window
    pub capacity: usize,
    /// Closed window summaries kept in the run report
    pub retained: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
            retained: DEFAULT_RETAINED_WINDOWS,
        }
    }
}

/// Run section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock bound in seconds
    pub max_duration_secs: u64,
    /// Stop after this many published events
    pub event_count: Option<u64>,
    /// Multiplier applied to simulated delays before waiting
    pub time_scale: f64,
    /// Seed for every random source; entropy when absent
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            event_count: None,
            time_scale: 1.0,
            seed: None,
        }
    }
}

/// Transport kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// In-process transport
    #[default]
    Memory,
    /// JSON-lines file
    Jsonl,
}

/// Transport section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Transport kind
    pub kind: TransportKind,
    /// Output file for the JSON-lines transport
    pub path: PathBuf,
    /// Stream name
    pub stream_name: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            path: PathBuf::from("output/events.jsonl"),
            stream_name: DEFAULT_STREAM_NAME.to_string(),
        }
    }
}

/// Producer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Dataset section
    pub dataset: DatasetConfig,
    /// Anomaly section
    pub anomaly: AnomalyConfig,
    /// Network section
    pub network: NetworkConfig,
    /// Window section
    pub window: WindowConfig,
    /// Run section
    pub run: RunConfig,
    /// Transport section
    pub transport: TransportConfig,
    /// Log level
    pub log_level: String,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            anomaly: AnomalyConfig::default(),
            network: NetworkConfig::default(),
            window: WindowConfig::default(),
            run: RunConfig::default(),
            transport: TransportConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ProducerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides
    pub fn with_env_override(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, value: String) -> Option<T> {
            let parsed = value.trim().parse().ok();
            if parsed.is_none() {
                warn!("Ignoring unparsable {}={}", key, value);
            }
            parsed
        }

        if let Some(path) = lookup("CREDIT_SIM_DATASET") {
            self.dataset.path = PathBuf::from(path);
        }
        if let Some(rate) = lookup("CREDIT_SIM_ANOMALY_RATE")
            .and_then(|v| parsed("CREDIT_SIM_ANOMALY_RATE", v))
        {
            self.anomaly.rate = rate;
        }
        if let Some(profile) =
            lookup("CREDIT_SIM_PROFILE").and_then(|v| parsed("CREDIT_SIM_PROFILE", v))
        {
            self.network.profile = profile;
        }
        if let Some(capacity) = lookup("CREDIT_SIM_WINDOW_CAPACITY")
            .and_then(|v| parsed("CREDIT_SIM_WINDOW_CAPACITY", v))
        {
            self.window.capacity = capacity;
        }
        if let Some(secs) = lookup("CREDIT_SIM_MAX_DURATION_SECS")
            .and_then(|v| parsed("CREDIT_SIM_MAX_DURATION_SECS", v))
        {
            self.run.max_duration_secs = secs;
        }
        if let Some(count) =
            lookup("CREDIT_SIM_EVENT_COUNT").and_then(|v| parsed("CREDIT_SIM_EVENT_COUNT", v))
        {
            self.run.event_count = Some(count);
        }
        if let Some(scale) =
            lookup("CREDIT_SIM_TIME_SCALE").and_then(|v| parsed("CREDIT_SIM_TIME_SCALE", v))
        {
            self.run.time_scale = scale;
        }
        if let Some(seed) = lookup("CREDIT_SIM_SEED").and_then(|v| parsed("CREDIT_SIM_SEED", v)) {
            self.run.seed = Some(seed);
        }
        if let Some(level) = lookup("CREDIT_SIM_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(name) = lookup("STREAM_NAME") {
            self.transport.stream_name = name;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.anomaly.rate) {
            errors.push(format!(
                "anomaly.rate {} must be between 0.0 and 1.0",
                self.anomaly.rate
            ));
        }
        if let Err(e) = self.anomaly.weights.validate() {
            errors.push(format!("anomaly.weights: {}", e));
        }

        if self.window.capacity == 0 {
            errors.push("window.capacity must be greater than 0".to_string());
        }

        if self.run.max_duration_secs == 0 {
            errors.push("run.max_duration_secs must be greater than 0".to_string());
        }
        if self.run.event_count == Some(0) {
            errors.push("run.event_count must be greater than 0 when set".to_string());
        }
        if !self.run.time_scale.is_finite() || self.run.time_scale < 0.0 {
            errors.push(format!(
                "run.time_scale {} must be a non-negative number",
                self.run.time_scale
            ));
        }

        if self.dataset.path.as_os_str().is_empty() {
            errors.push("dataset.path cannot be empty".to_string());
        }
        if self.transport.stream_name.trim().is_empty() {
            errors.push("transport.stream_name cannot be empty".to_string());
        }
        if self.transport.kind == TransportKind::Jsonl && self.transport.path.as_os_str().is_empty()
        {
            errors.push("transport.path is required for the jsonl transport".to_string());
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, valid_log_levels
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from file (or defaults) with environment overrides and validate
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_or_default(path)?.with_env_override();
        config.validate()?;
        Ok(config)
    }

    /// Run bounds
    pub fn limits(&self) -> RunLimits {
        RunLimits {
            max_duration: Duration::from_secs(self.run.max_duration_secs),
            event_count_limit: self.run.event_count,
        }
    }

    /// Network profile, scaled for `hour` when time-of-day adjustment is on
    pub fn network_profile(&self, hour: u32) -> Result<NetworkProfile, SimulatorError> {
        let profile = self.network.profile.profile();
        if self.network.time_of_day {
            profile.for_hour(hour)
        } else {
            Ok(profile)
        }
    }
}
