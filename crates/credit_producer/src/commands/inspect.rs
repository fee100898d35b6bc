//! Inspect command implementation
//!
//! Loads a dataset and prints its statistics and risk distribution.

use anyhow::Result;
use credit_core::types::RiskLevel;
use credit_core::DatasetLoader;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Summarise a dataset file
pub fn run(path: &Path) -> Result<()> {
    info!("Inspecting {}", path.display());
    let dataset = DatasetLoader::new().load(path)?;
    let stats = dataset.stats();

    let mut risk: HashMap<RiskLevel, usize> = HashMap::new();
    for record in dataset.iter() {
        *risk.entry(record.risk_level()).or_default() += 1;
    }

    println!("records:          {}", stats.total_records);
    println!("default rate:     {:.2}%", stats.default_rate * 100.0);
    println!("avg credit limit: {:.0}", stats.avg_credit_limit);
    println!("avg age:          {:.1}", stats.avg_age);
    for level in RiskLevel::ALL {
        let count = risk.get(&level).copied().unwrap_or(0);
        println!(
            "risk {:<7}      {} ({:.1}%)",
            level.to_string(),
            count,
            count as f64 / stats.total_records as f64 * 100.0
        );
    }
    Ok(())
}
