//! Network latency simulation.
//!
//! This module provides:
//! - `profile`: Built-in [`NetworkCondition`]s and the [`NetworkProfile`] parameters
//! - `simulator`: [`LatencySimulator`] drawing one [`LatencySample`] per event
//! - `stats`: [`LatencyStats`] over the samples drawn so far

pub mod profile;
pub mod simulator;
pub mod stats;

pub use profile::{time_of_day_factor, NetworkCondition, NetworkProfile};
pub use simulator::{pacing, LatencySample, LatencySimulator};
pub use stats::{LatencyRecorder, LatencyStats};
