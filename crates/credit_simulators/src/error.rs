//! Error types for simulator construction.
//!
//! Simulators validate their parameters once when built; sampling and
//! injection themselves never fail.

use thiserror::Error;

/// Invalid simulator parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    /// Anomaly rate outside [0, 1]
    #[error("Anomaly rate {0} must be between 0.0 and 1.0")]
    InvalidRate(f64),

    /// Anomaly weight table unusable
    #[error("Invalid anomaly weights: {0}")]
    InvalidWeights(String),

    /// Network profile parameters out of range
    #[error("Invalid network profile '{name}': {reason}")]
    InvalidProfile {
        /// Profile name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Profile name not in the enumerated set
    #[error("Unknown network condition '{0}'. Options: excellent, good, normal, poor, terrible")]
    UnknownCondition(String),

    /// Hour of day outside 0..=23
    #[error("Hour of day {0} must be between 0 and 23")]
    InvalidHour(u32),

    /// Window capacity of zero
    #[error("Window capacity must be greater than 0")]
    ZeroWindowCapacity,
}
