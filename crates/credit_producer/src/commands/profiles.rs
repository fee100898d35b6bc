//! Profiles command implementation

use anyhow::Result;
use credit_simulators::latency::NetworkCondition;

/// List the built-in network profiles
pub fn run() -> Result<()> {
    println!(
        "{:<10} {:>8} {:>10} {:>8} {:>12}",
        "profile", "base_ms", "jitter_ms", "spike%", "multiplier"
    );
    for condition in NetworkCondition::ALL {
        let profile = condition.profile();
        println!(
            "{:<10} {:>8.1} {:>10.1} {:>8.2} {:>5.0}-{:<5.0}",
            profile.name,
            profile.base_ms,
            profile.jitter_ms,
            profile.spike_probability * 100.0,
            profile.spike_multiplier_min,
            profile.spike_multiplier_max
        );
    }
    Ok(())
}
