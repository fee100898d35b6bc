//! In-memory bronze store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credit_core::types::{BankingEvent, RiskLevel};
use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{BronzeIndexKey, BronzeStore};
use crate::error::StoreError;

type IndexEntry = (DateTime<Utc>, String);

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<String, (BankingEvent, BronzeIndexKey)>,
    by_customer: HashMap<String, Vec<IndexEntry>>,
    by_risk: HashMap<RiskLevel, Vec<IndexEntry>>,
    arrival: VecDeque<String>,
}

impl Tables {
    fn unindex(&mut self, event_id: &str, key: &BronzeIndexKey) {
        if let Some(entries) = self.by_customer.get_mut(&key.customer_id) {
            entries.retain(|(_, id)| id != event_id);
        }
        if let Some(entries) = self.by_risk.get_mut(&key.risk_level) {
            entries.retain(|(_, id)| id != event_id);
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(event_id) = self.arrival.pop_front() {
            if let Some((_, key)) = self.events.remove(&event_id) {
                self.unindex(&event_id, &key);
            }
        }
    }

    fn newest_first(&self, entries: Option<&Vec<IndexEntry>>, limit: usize) -> Vec<BankingEvent> {
        let mut entries: Vec<&IndexEntry> = entries.map(|e| e.iter().collect()).unwrap_or_default();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries
            .into_iter()
            .filter_map(|(_, id)| self.events.get(id).map(|(event, _)| event.clone()))
            .take(limit)
            .collect()
    }
}

/// Bronze store held in process memory.
///
/// Unbounded unless built with [`with_capacity`](Self::with_capacity), in
/// which case the earliest stored events are evicted first.
#[derive(Debug, Default)]
pub struct InMemoryBronzeStore {
    capacity: Option<usize>,
    tables: RwLock<Tables>,
}

impl InMemoryBronzeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store keeping at most `max` events (`max = 0` keeps all).
    pub fn with_capacity(max: usize) -> Self {
        Self {
            capacity: (max > 0).then_some(max),
            tables: RwLock::default(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Event stored under `event_id`.
    pub fn get(&self, event_id: &str) -> Option<BankingEvent> {
        self.read().events.get(event_id).map(|(event, _)| event.clone())
    }

    /// Up to `limit` events of `customer_id`, newest first.
    pub fn by_customer(&self, customer_id: &str, limit: usize) -> Vec<BankingEvent> {
        let tables = self.read();
        tables.newest_first(tables.by_customer.get(customer_id), limit)
    }

    /// Up to `limit` events at `level`, newest first.
    pub fn by_risk_level(&self, level: RiskLevel, limit: usize) -> Vec<BankingEvent> {
        let tables = self.read();
        tables.newest_first(tables.by_risk.get(&level), limit)
    }

    /// Up to `limit` events stamped at or after `cutoff`, newest first.
    pub fn since(&self, cutoff: DateTime<Utc>, limit: usize) -> Vec<BankingEvent> {
        let tables = self.read();
        let mut events: Vec<&(BankingEvent, BronzeIndexKey)> = tables
            .events
            .values()
            .filter(|(_, key)| key.timestamp >= cutoff)
            .collect();
        events.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        events
            .into_iter()
            .take(limit)
            .map(|(event, _)| event.clone())
            .collect()
    }

    /// Up to `limit` events from the last `window`, newest first.
    pub fn recent(&self, window: chrono::Duration, limit: usize) -> Vec<BankingEvent> {
        self.since(Utc::now() - window, limit)
    }

    /// Up to `limit` events carrying anomaly flags, in no particular order.
    pub fn anomalies(&self, limit: usize) -> Vec<BankingEvent> {
        self.read()
            .events
            .values()
            .filter(|(event, _)| event.has_anomalies())
            .map(|(event, _)| event.clone())
            .take(limit)
            .collect()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored events per risk level.
    pub fn risk_counts(&self) -> HashMap<RiskLevel, usize> {
        self.read()
            .by_risk
            .iter()
            .map(|(level, entries)| (*level, entries.len()))
            .collect()
    }
}

#[async_trait]
impl BronzeStore for InMemoryBronzeStore {
    async fn put(&self, event: BankingEvent, key: BronzeIndexKey) -> Result<(), StoreError> {
        let mut tables = self.write();
        let event_id = event.event_id.clone();

        match tables.events.remove(&event_id) {
            Some((_, previous)) => tables.unindex(&event_id, &previous),
            None => tables.arrival.push_back(event_id.clone()),
        }

        let entry = (key.timestamp, event_id.clone());
        tables
            .by_customer
            .entry(key.customer_id.clone())
            .or_default()
            .push(entry.clone());
        tables.by_risk.entry(key.risk_level).or_default().push(entry);
        tables.events.insert(event_id, (event, key));

        if let Some(max) = self.capacity {
            while tables.events.len() > max {
                tables.evict_oldest();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use credit_core::types::{
        AnomalyFlag, AnomalyKind, Credit, Customer, Demographic, Education, MaritalStatus,
        MonthlyValues, Risk, Severity, Sex,
    };

    fn event(id: &str, customer: &str, level: RiskLevel, offset_secs: i64) -> BankingEvent {
        BankingEvent {
            event_id: id.to_string(),
            event_type: "CREDIT_ASSESSMENT".to_string(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(offset_secs),
            source_system: "CREDIT_CARD_SYSTEM".to_string(),
            customer: Customer {
                customer_id: customer.to_string(),
                demographic: Demographic {
                    sex: Sex::M,
                    education: Education::HighSchool,
                    marital_status: MaritalStatus::Single,
                    age: Some(45),
                },
            },
            credit: Credit {
                credit_limit: 80_000,
                currency: "TWD".to_string(),
            },
            payment_history: MonthlyValues::uniform(0),
            billing_amounts: MonthlyValues::uniform(1_000),
            payment_amounts: Some(MonthlyValues::uniform(1_000)),
            risk: Risk {
                default_payment_next_month: u8::from(level != RiskLevel::Low),
                risk_level: level,
            },
            anomaly_flags: Vec::new(),
            is_duplicate: false,
            duplicate_of: None,
            simulated_latency_ms: Some(12.0),
        }
    }

    async fn put(store: &InMemoryBronzeStore, event: BankingEvent) {
        let key = BronzeIndexKey::for_event(&event);
        store.put(event, key).await.unwrap();
    }

    #[tokio::test]
    async fn test_queries_newest_first() {
        let store = InMemoryBronzeStore::new();
        put(&store, event("EVT-1", "CUST-000001", RiskLevel::Low, 10)).await;
        put(&store, event("EVT-2", "CUST-000001", RiskLevel::High, 30)).await;
        put(&store, event("EVT-3", "CUST-000002", RiskLevel::High, 20)).await;

        let ids = |events: Vec<BankingEvent>| -> Vec<String> {
            events.into_iter().map(|e| e.event_id).collect()
        };
        assert_eq!(ids(store.by_customer("CUST-000001", 10)), vec!["EVT-2", "EVT-1"]);
        assert_eq!(ids(store.by_risk_level(RiskLevel::High, 10)), vec!["EVT-2", "EVT-3"]);
        assert_eq!(ids(store.by_risk_level(RiskLevel::High, 1)), vec!["EVT-2"]);
        assert!(store.by_risk_level(RiskLevel::Medium, 10).is_empty());
        assert_eq!(store.len(), 3);
        assert_eq!(store.risk_counts()[&RiskLevel::High], 2);
    }

    #[tokio::test]
    async fn test_put_replaces_by_id() {
        let store = InMemoryBronzeStore::new();
        put(&store, event("EVT-1", "CUST-000001", RiskLevel::Low, 10)).await;
        put(&store, event("EVT-1", "CUST-000001", RiskLevel::High, 20)).await;

        assert_eq!(store.len(), 1);
        assert!(store.by_risk_level(RiskLevel::Low, 10).is_empty());
        assert_eq!(store.by_customer("CUST-000001", 10).len(), 1);
        assert_eq!(store.get("EVT-1").unwrap().risk_level(), RiskLevel::High);
    }

    #[tokio::test]
    async fn test_anomaly_scan() {
        let store = InMemoryBronzeStore::new();
        let mut flagged = event("EVT-9", "CUST-000009", RiskLevel::Medium, 5);
        flagged.anomaly_flags.push(AnomalyFlag::new(
            AnomalyKind::MissingFields,
            Severity::Medium,
            "Missing fields: age",
        ));
        flagged.customer.demographic.age = None;
        put(&store, flagged).await;
        put(&store, event("EVT-10", "CUST-000010", RiskLevel::Low, 6)).await;

        let anomalies = store.anomalies(10);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].event_id, "EVT-9");
        assert!(anomalies[0].customer.demographic.age.is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_earliest_stored() {
        let store = InMemoryBronzeStore::with_capacity(2);
        put(&store, event("EVT-1", "CUST-000001", RiskLevel::High, 10)).await;
        put(&store, event("EVT-2", "CUST-000001", RiskLevel::Low, 20)).await;
        // Replacing an event keeps its place in line
        put(&store, event("EVT-1", "CUST-000001", RiskLevel::High, 15)).await;
        put(&store, event("EVT-3", "CUST-000002", RiskLevel::Low, 5)).await;

        assert_eq!(store.len(), 2);
        assert!(store.get("EVT-1").is_none());
        assert!(store.by_risk_level(RiskLevel::High, 10).is_empty());
        assert_eq!(store.by_customer("CUST-000001", 10).len(), 1);
        assert_eq!(store.risk_counts()[&RiskLevel::Low], 2);
    }

    #[tokio::test]
    async fn test_since_bounds_by_timestamp() {
        let store = InMemoryBronzeStore::new();
        put(&store, event("EVT-1", "CUST-000001", RiskLevel::Low, 60)).await;
        put(&store, event("EVT-2", "CUST-000002", RiskLevel::High, 300)).await;
        put(&store, event("EVT-3", "CUST-000003", RiskLevel::Medium, 240)).await;

        let cutoff = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(240);
        let ids: Vec<String> = store
            .since(cutoff, 10)
            .into_iter()
            .map(|e| e.event_id)
            .collect();
        assert_eq!(ids, vec!["EVT-2", "EVT-3"]);
        assert_eq!(store.since(cutoff, 1)[0].event_id, "EVT-2");
    }

    #[tokio::test]
    async fn test_recent_window() {
        let store = InMemoryBronzeStore::new();
        let mut fresh = event("EVT-NEW", "CUST-000001", RiskLevel::Low, 0);
        fresh.timestamp = Utc::now();
        let mut stale = event("EVT-OLD", "CUST-000001", RiskLevel::Low, 0);
        stale.timestamp = Utc::now() - Duration::minutes(30);
        put(&store, fresh).await;
        put(&store, stale).await;

        let recent = store.recent(Duration::minutes(5), 10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].event_id, "EVT-NEW");
        assert_eq!(store.recent(Duration::hours(1), 10).len(), 2);
    }
}
