//! Bronze store: raw events as received from the stream.
//!
//! Events are stored unmodified, anomalies included, and indexed by
//! customer and by risk level with the newest first.

mod consumer;
mod memory;

pub use consumer::{BronzeConsumer, ConsumerStats};
pub use memory::InMemoryBronzeStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credit_core::types::{BankingEvent, RiskLevel};

use crate::error::StoreError;

/// Secondary index key of a stored event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BronzeIndexKey {
    /// Risk level index
    pub risk_level: RiskLevel,
    /// Customer index
    pub customer_id: String,
    /// Sort key of both indexes
    pub timestamp: DateTime<Utc>,
}

impl BronzeIndexKey {
    /// Key derived from the event itself.
    pub fn for_event(event: &BankingEvent) -> Self {
        Self {
            risk_level: event.risk_level(),
            customer_id: event.customer.customer_id.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// Durable sink for consumed events.
#[async_trait]
pub trait BronzeStore: Send + Sync {
    /// Stores `event` under its identifier, replacing any previous version.
    async fn put(&self, event: BankingEvent, key: BronzeIndexKey) -> Result<(), StoreError>;
}
