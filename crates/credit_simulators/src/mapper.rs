//! Dataset row to banking event mapping.
//!
//! Mapping is a pure function of the record and its position except for the
//! captured timestamp. Identifiers are deterministic within a run:
//! `EVT-{run_tag}-{cycle:04}-{record:06}`. The run tag keeps identifiers
//! from colliding across restarts or parallel engines.

use chrono::{DateTime, Utc};
use credit_core::types::{
    BankingEvent, Credit, Customer, DatasetRecord, Demographic, Education, MaritalStatus,
    MonthlyValues, Risk, Sex, DEFAULT_CURRENCY, EVENT_TYPE_CREDIT_ASSESSMENT, SOURCE_SYSTEM,
};
use rand::Rng;

/// Maps dataset rows to banking events.
#[derive(Debug, Clone)]
pub struct EventMapper {
    run_tag: String,
    last_timestamp: Option<DateTime<Utc>>,
}

impl EventMapper {
    /// Creates a mapper stamping identifiers with `run_tag`.
    pub fn new(run_tag: impl Into<String>) -> Self {
        Self {
            run_tag: run_tag.into(),
            last_timestamp: None,
        }
    }

    /// Creates a mapper with a random 8 hex digit run tag.
    pub fn with_random_tag<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(format!("{:08x}", rng.gen::<u32>()))
    }

    /// Run tag embedded in every identifier.
    pub fn run_tag(&self) -> &str {
        &self.run_tag
    }

    /// Identifier for the given position.
    ///
    /// # Examples
    ///
    /// ```
    /// use credit_simulators::mapper::EventMapper;
    ///
    /// let mapper = EventMapper::new("00c0ffee");
    /// assert_eq!(mapper.event_id(2, 15), "EVT-00c0ffee-0002-000015");
    /// ```
    pub fn event_id(&self, cycle_index: u64, record_index: usize) -> String {
        format!("EVT-{}-{:04}-{:06}", self.run_tag, cycle_index, record_index)
    }

    /// Maps `record` at (`cycle_index`, `record_index`) to an event.
    pub fn map(
        &mut self,
        record: &DatasetRecord,
        cycle_index: u64,
        record_index: usize,
    ) -> BankingEvent {
        BankingEvent {
            event_id: self.event_id(cycle_index, record_index),
            event_type: EVENT_TYPE_CREDIT_ASSESSMENT.to_string(),
            timestamp: self.capture_timestamp(),
            source_system: SOURCE_SYSTEM.to_string(),
            customer: Customer {
                customer_id: record.customer_id(),
                demographic: Demographic {
                    sex: Sex::from_code(record.sex),
                    education: Education::from_code(record.education),
                    marital_status: MaritalStatus::from_code(record.marriage),
                    age: Some(record.age),
                },
            },
            credit: Credit {
                credit_limit: record.credit_limit,
                currency: DEFAULT_CURRENCY.to_string(),
            },
            payment_history: MonthlyValues::from_array(record.pay_status),
            billing_amounts: MonthlyValues::from_array(record.bill_amounts),
            payment_amounts: Some(MonthlyValues::from_array(record.pay_amounts)),
            risk: Risk {
                default_payment_next_month: u8::from(record.default_next_month),
                risk_level: record.risk_level(),
            },
            anomaly_flags: Vec::new(),
            is_duplicate: false,
            duplicate_of: None,
            simulated_latency_ms: None,
        }
    }

    /// Wall-clock capture, clamped so it never goes backwards.
    fn capture_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_core::types::RiskLevel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(default: bool, pay_status: [i32; 6]) -> DatasetRecord {
        DatasetRecord {
            id: 42,
            credit_limit: 50_000,
            sex: 1,
            education: 1,
            marriage: 2,
            age: 37,
            pay_status,
            bill_amounts: [46_990, 48_233, 49_291, 28_314, 28_959, 29_547],
            pay_amounts: [2_000, 2_019, 1_200, 1_100, 1_069, 1_000],
            default_next_month: default,
        }
    }

    #[test]
    fn test_map_sections() {
        let mut mapper = EventMapper::new("deadbeef");
        let event = mapper.map(&record(false, [0; 6]), 0, 3);

        assert_eq!(event.event_id, "EVT-deadbeef-0000-000003");
        assert_eq!(event.event_type, "CREDIT_ASSESSMENT");
        assert_eq!(event.source_system, "CREDIT_CARD_SYSTEM");
        assert_eq!(event.customer.customer_id, "CUST-000042");
        assert_eq!(event.customer.demographic.sex, Sex::M);
        assert_eq!(event.customer.demographic.education, Education::GraduateSchool);
        assert_eq!(event.customer.demographic.marital_status, MaritalStatus::Single);
        assert_eq!(event.customer.demographic.age, Some(37));
        assert_eq!(event.credit.currency, "TWD");
        assert_eq!(event.billing_amounts.june, 28_314);
        assert_eq!(event.payment_amounts.unwrap().april, 1_000);
        assert_eq!(event.risk.default_payment_next_month, 0);
        assert!(!event.has_anomalies());
        assert!(event.simulated_latency_ms.is_none());
    }

    #[test]
    fn test_risk_rule() {
        let mut mapper = EventMapper::new("t");
        assert_eq!(mapper.map(&record(false, [5; 6]), 0, 0).risk_level(), RiskLevel::Low);
        assert_eq!(mapper.map(&record(true, [2; 6]), 0, 0).risk_level(), RiskLevel::Medium);
        assert_eq!(
            mapper.map(&record(true, [0, 0, 0, 0, 0, 3]), 0, 0).risk_level(),
            RiskLevel::High
        );
    }

    #[test]
    fn test_same_position_same_id() {
        let mut mapper = EventMapper::new("abc");
        let a = mapper.map(&record(false, [0; 6]), 1, 9);
        let b = mapper.map(&record(false, [0; 6]), 1, 9);
        assert_eq!(a.event_id, b.event_id);
        assert_ne!(a.event_id, mapper.map(&record(false, [0; 6]), 2, 9).event_id);
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let mut mapper = EventMapper::new("abc");
        let mut last = mapper.map(&record(false, [0; 6]), 0, 0).timestamp;
        for i in 1..200 {
            let ts = mapper.map(&record(false, [0; 6]), 0, i).timestamp;
            assert!(ts >= last);
            last = ts;
        }
    }

    #[test]
    fn test_random_tag_is_eight_hex_digits() {
        let mut rng = StdRng::seed_from_u64(1);
        let mapper = EventMapper::with_random_tag(&mut rng);
        assert_eq!(mapper.run_tag().len(), 8);
        assert!(mapper.run_tag().chars().all(|c| c.is_ascii_hexdigit()));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(300))]

            #[test]
            fn test_risk_level_ignores_position(
                default in any::<bool>(),
                history in proptest::array::uniform6(-2i32..10),
                cycle in 0u64..10_000,
                index in 0usize..30_000,
            ) {
                let mut mapper = EventMapper::new("prop");
                let rec = record(default, history);
                let at_origin = mapper.map(&rec, 0, 0).risk_level();
                let elsewhere = mapper.map(&rec, cycle, index).risk_level();
                prop_assert_eq!(at_origin, elsewhere);
                prop_assert_eq!(at_origin, RiskLevel::assess(default, &history));
            }
        }
    }
}
