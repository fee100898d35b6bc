//! Shared fixtures for the producer integration tests.

#![allow(dead_code)]

use credit_core::{Dataset, DatasetLoader};
use credit_producer::config::ProducerConfig;
use credit_simulators::latency::NetworkCondition;

pub const HEADER: &str = "ID,LIMIT_BAL,SEX,EDUCATION,MARRIAGE,AGE,PAY_0,PAY_2,PAY_3,PAY_4,PAY_5,PAY_6,\
BILL_AMT1,BILL_AMT2,BILL_AMT3,BILL_AMT4,BILL_AMT5,BILL_AMT6,\
PAY_AMT1,PAY_AMT2,PAY_AMT3,PAY_AMT4,PAY_AMT5,PAY_AMT6,default payment next month";

pub const ROWS: [&str; 3] = [
    "1,20000,2,2,1,24,2,2,-1,-1,-2,-2,3913,3102,689,0,0,0,0,689,0,0,0,0,1",
    "2,120000,2,2,2,26,-1,2,0,0,0,2,2682,1725,2682,3272,3455,3261,0,1000,1000,1000,0,2000,1",
    "3,90000,2,2,2,34,0,0,0,0,0,0,29239,14027,13559,14331,14948,15549,1518,1500,1000,1000,1000,5000,0",
];

pub const AGE_150_ROW: &str =
    "4,50000,1,2,1,150,0,0,0,0,0,0,1000,1000,1000,1000,1000,1000,100,100,100,100,100,100,0";

pub fn dataset(rows: &[&str]) -> Dataset {
    let mut csv = String::from(HEADER);
    for row in rows {
        csv.push('\n');
        csv.push_str(row);
    }
    csv.push('\n');
    DatasetLoader::new()
        .load_from_reader(csv.as_bytes())
        .unwrap()
}

pub fn three_records() -> Dataset {
    dataset(&ROWS)
}

/// Deterministic configuration without pacing or anomalies.
pub fn quiet_config() -> ProducerConfig {
    let mut config = ProducerConfig::default();
    config.anomaly.rate = 0.0;
    config.network.profile = NetworkCondition::Good;
    config.network.time_of_day = false;
    config.window.capacity = 3;
    config.run.time_scale = 0.0;
    config.run.seed = Some(42);
    config
}
