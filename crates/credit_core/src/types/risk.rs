//! Risk levels and anomaly severities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Repayment delay (in months) at which a history entry counts as severe delinquency.
pub const SEVERE_DELINQUENCY_MONTHS: i32 = 3;

/// Credit risk level of an event.
///
/// Ordered from least to most risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// No default expected
    Low,
    /// Default expected, history without severe delinquency
    Medium,
    /// Default expected and at least one severely delinquent month
    High,
}

impl RiskLevel {
    /// All levels, least risky first.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Derives the risk level from the default label and repayment history.
    ///
    /// Pure: depends on nothing but its two arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use credit_core::types::RiskLevel;
    ///
    /// assert_eq!(RiskLevel::assess(false, &[8, 8, 8, 8, 8, 8]), RiskLevel::Low);
    /// assert_eq!(RiskLevel::assess(true, &[0, 1, 2, 0, 0, 0]), RiskLevel::Medium);
    /// assert_eq!(RiskLevel::assess(true, &[0, 1, 2, 3, 0, 0]), RiskLevel::High);
    /// ```
    pub fn assess(default_next_month: bool, pay_status: &[i32]) -> Self {
        if !default_next_month {
            return RiskLevel::Low;
        }
        if pay_status
            .iter()
            .any(|&status| status >= SEVERE_DELINQUENCY_MONTHS)
        {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }

    /// Upper-case label as published.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an injected anomaly, graded by distance from the valid domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Plausible but suspicious
    Low,
    /// Outside the usual range
    Medium,
    /// Impossible or far outside the valid domain
    High,
}

impl Severity {
    /// Upper-case label as published.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
