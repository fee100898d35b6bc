//! # Credit Event Simulators
//!
//! The stateful pieces of the simulation engine. Each simulator owns its
//! own seeded random source so a run is reproducible from a single seed.
//!
//! ## Modules
//!
//! - [`mapper`]: Turns a dataset row into a [`BankingEvent`](credit_core::types::BankingEvent)
//! - [`anomaly`]: Injects one of six data-quality defects with graded severity
//! - [`latency`]: Samples transport delays from a network profile
//! - [`window`]: Count-based tumbling window statistics

pub mod anomaly;
pub mod error;
pub mod latency;
pub mod mapper;
pub mod rng;
pub mod window;

pub use error::SimulatorError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::anomaly::{AnomalyInjector, AnomalyWeights, InjectionOutcome, InjectorStats};
    pub use crate::error::SimulatorError;
    pub use crate::latency::{
        LatencySample, LatencySimulator, LatencyStats, NetworkCondition, NetworkProfile,
    };
    pub use crate::mapper::EventMapper;
    pub use crate::window::{WindowAggregator, WindowSummary};
}
