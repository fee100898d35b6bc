//! The published banking event.
//!
//! Field names follow the stream payload: a flat header (`event_id`,
//! `event_type`, `timestamp`, `source_system`) followed by nested
//! `customer`, `credit`, `payment_history`, `billing_amounts`,
//! `payment_amounts` and `risk` sections. Optional sections are omitted from
//! the payload rather than serialised as `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::anomaly::AnomalyFlag;
use super::demographic::{Education, MaritalStatus, Sex};
use super::record::MonthlyValues;
use super::risk::{RiskLevel, Severity};

/// Event type tag carried by every event.
pub const EVENT_TYPE_CREDIT_ASSESSMENT: &str = "CREDIT_ASSESSMENT";

/// Source system tag carried by every event.
pub const SOURCE_SYSTEM: &str = "CREDIT_CARD_SYSTEM";

/// Currency of the dataset amounts (New Taiwan dollar).
pub const DEFAULT_CURRENCY: &str = "TWD";

/// Demographic sub-section of the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographic {
    /// Sex
    pub sex: Sex,
    /// Education
    pub education: Education,
    /// Marital status
    pub marital_status: MaritalStatus,
    /// Age in years; absent when removed by a missing-fields anomaly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
}

/// Customer section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer identifier, also the partition key
    pub customer_id: String,
    /// Demographic attributes
    pub demographic: Demographic,
}

/// Credit section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    /// Granted credit limit
    pub credit_limit: i64,
    /// Currency code
    pub currency: String,
}

/// Risk section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    /// Default label as 0/1
    pub default_payment_next_month: u8,
    /// Level derived before any anomaly mutation
    pub risk_level: RiskLevel,
}

/// One credit assessment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankingEvent {
    /// Identifier, unique per emission within a run
    pub event_id: String,
    /// Constant event type tag
    pub event_type: String,
    /// Capture time
    pub timestamp: DateTime<Utc>,
    /// Source system tag
    pub source_system: String,
    /// Customer section
    pub customer: Customer,
    /// Credit section
    pub credit: Credit,
    /// Repayment status per month
    pub payment_history: MonthlyValues<i32>,
    /// Bill statement amounts per month
    pub billing_amounts: MonthlyValues<i64>,
    /// Amounts paid per month; absent when removed by a missing-fields anomaly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amounts: Option<MonthlyValues<i64>>,
    /// Risk section
    pub risk: Risk,
    /// Injected defects, in injection order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomaly_flags: Vec<AnomalyFlag>,
    /// Set on the replica emitted by a duplicate-event anomaly
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_duplicate: bool,
    /// Identifier of the event this one duplicates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<String>,
    /// Simulated transport latency in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_latency_ms: Option<f64>,
}

impl BankingEvent {
    /// Stream partition key (the customer identifier).
    pub fn partition_key(&self) -> &str {
        &self.customer.customer_id
    }

    /// Risk level as derived at mapping time.
    pub fn risk_level(&self) -> RiskLevel {
        self.risk.risk_level
    }

    /// Whether any anomaly flag is attached.
    pub fn has_anomalies(&self) -> bool {
        !self.anomaly_flags.is_empty()
    }

    /// Most severe attached flag, if any.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.anomaly_flags.iter().map(|flag| flag.severity).max()
    }

    /// Serialises the event as the JSON stream payload.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
