//! # credit_core: Data Foundation for the Credit Event Simulator
//!
//! ## Layer 1 (Foundation) Role
//!
//! credit_core is the bottom layer of the simulator workspace, providing:
//! - Dataset rows and their loader (`dataset`)
//! - The published event model: customer, credit, payment history, risk (`types::event`)
//! - Risk levels and anomaly severities (`types::risk`)
//! - Anomaly kinds and flags attached to degraded events (`types::anomaly`)
//! - Error types: `DatasetLoadError` (`error`)
//!
//! ## Minimal Dependency Principle
//!
//! Layer 1 has no dependencies on other credit_* crates and carries no
//! randomness: everything here is a deterministic function of its inputs.
//!
//! ## Usage Examples
//!
//! ```rust
//! use credit_core::types::{MonthlyValues, RiskLevel};
//!
//! // Default label with a three-month delinquency is high risk
//! let history = MonthlyValues::from_array([0, 0, 3, 0, 0, 0]);
//! assert_eq!(RiskLevel::assess(true, &history.to_array()), RiskLevel::High);
//!
//! // Default label alone is medium
//! assert_eq!(RiskLevel::assess(true, &[0; 6]), RiskLevel::Medium);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod dataset;
pub mod error;
pub mod types;

pub use dataset::{Dataset, DatasetLoader, DatasetStats};
pub use error::DatasetLoadError;
