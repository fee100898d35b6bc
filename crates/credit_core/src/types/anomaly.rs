//! Anomaly kinds and flags.
//!
//! Flags are structured metadata attached to an event describing an injected
//! data-quality defect. The mutations themselves live with the injector; this
//! module only names them so flags can be published and queried.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::risk::Severity;

/// The six kinds of injected data-quality defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// Credit limit replaced with an out-of-range value
    UnusualCreditLimit,
    /// All six months forced to one severe delinquency code
    PaymentPatternAnomaly,
    /// Billing and payment amounts made inconsistent
    BillingMismatch,
    /// Impossible age or education inconsistent with age
    DemographicInconsistency,
    /// Event re-emitted as a structural duplicate
    DuplicateEvent,
    /// Required fields removed from the payload
    MissingFields,
}

impl AnomalyKind {
    /// Every kind, in table order.
    pub const ALL: [AnomalyKind; 6] = [
        AnomalyKind::UnusualCreditLimit,
        AnomalyKind::PaymentPatternAnomaly,
        AnomalyKind::BillingMismatch,
        AnomalyKind::DemographicInconsistency,
        AnomalyKind::DuplicateEvent,
        AnomalyKind::MissingFields,
    ];

    /// Published type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::UnusualCreditLimit => "UNUSUAL_CREDIT_LIMIT",
            AnomalyKind::PaymentPatternAnomaly => "PAYMENT_PATTERN_ANOMALY",
            AnomalyKind::BillingMismatch => "BILLING_MISMATCH",
            AnomalyKind::DemographicInconsistency => "DEMOGRAPHIC_INCONSISTENCY",
            AnomalyKind::DuplicateEvent => "DUPLICATE_EVENT",
            AnomalyKind::MissingFields => "MISSING_FIELDS",
        }
    }

    /// Position in [`AnomalyKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            AnomalyKind::UnusualCreditLimit => 0,
            AnomalyKind::PaymentPatternAnomaly => 1,
            AnomalyKind::BillingMismatch => 2,
            AnomalyKind::DemographicInconsistency => 3,
            AnomalyKind::DuplicateEvent => 4,
            AnomalyKind::MissingFields => 5,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing one injected defect.
///
/// # Examples
///
/// ```
/// use credit_core::types::{AnomalyFlag, AnomalyKind, Severity};
///
/// let flag = AnomalyFlag::new(AnomalyKind::DuplicateEvent, Severity::Low, "re-emitted");
/// let json = serde_json::to_value(&flag).unwrap();
/// assert_eq!(json["type"], "DUPLICATE_EVENT");
/// assert_eq!(json["severity"], "LOW");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    /// Kind of defect
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// Graded severity
    pub severity: Severity,
    /// Human-readable description derived from the injected values
    pub description: String,
}

impl AnomalyFlag {
    /// Creates a flag.
    pub fn new(kind: AnomalyKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
        }
    }
}
