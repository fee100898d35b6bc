//! Record, event, risk and anomaly types.
//!
//! This module provides:
//! - `record`: Immutable dataset rows and the six-month [`MonthlyValues`] container
//! - `demographic`: Categorical customer attributes decoded from dataset codes
//! - `risk`: [`RiskLevel`] assessment and anomaly [`Severity`]
//! - `anomaly`: The six [`AnomalyKind`]s and the [`AnomalyFlag`] metadata
//! - `event`: The published [`BankingEvent`] and its nested sections
//!
//! # Re-exports
//!
//! Commonly used types are re-exported at this module level.

pub mod anomaly;
pub mod demographic;
pub mod event;
pub mod record;
pub mod risk;

pub use anomaly::{AnomalyFlag, AnomalyKind};
pub use demographic::{Education, MaritalStatus, Sex};
pub use event::{
    BankingEvent, Credit, Customer, Demographic, Risk, DEFAULT_CURRENCY, EVENT_TYPE_CREDIT_ASSESSMENT,
    SOURCE_SYSTEM,
};
pub use record::{DatasetRecord, MonthlyValues, MONTH_NAMES};
pub use risk::{RiskLevel, Severity, SEVERE_DELINQUENCY_MONTHS};
