//! Run reports.

use credit_simulators::anomaly::InjectorStats;
use credit_simulators::latency::LatencyStats;
use credit_simulators::window::WindowSummary;
use serde::Serialize;
use tracing::info;

use super::{EngineState, StopReason};

/// Totals of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSummary {
    /// Tag embedded in every event identifier
    pub run_tag: String,
    /// Terminal state
    pub state: EngineState,
    /// Why the run ended; `None` if it never started
    pub stop_reason: Option<StopReason>,
    /// Events accepted by the transport, duplicates included
    pub total_emitted: u64,
    /// Emitted events carrying anomaly flags
    pub total_anomalies: u64,
    /// Duplicate companions emitted
    pub duplicates_emitted: u64,
    /// Dataset rows consumed
    pub records_consumed: u64,
    /// Complete passes over the dataset
    pub cycles_completed: u64,
    /// Publishes the transport rejected
    pub publish_failures: u64,
    /// Wall-clock run time in seconds
    pub runtime_secs: f64,
    /// Windows closed, the flushed partial window included
    pub windows_closed: u64,
    /// Latency statistics
    pub latency: LatencyStats,
    /// Injector counters
    pub injector: InjectorStats,
}

impl FinalSummary {
    /// Summary of a run that never emitted anything.
    pub fn empty(run_tag: impl Into<String>) -> Self {
        Self {
            run_tag: run_tag.into(),
            state: EngineState::Idle,
            stop_reason: None,
            total_emitted: 0,
            total_anomalies: 0,
            duplicates_emitted: 0,
            records_consumed: 0,
            cycles_completed: 0,
            publish_failures: 0,
            runtime_secs: 0.0,
            windows_closed: 0,
            latency: LatencyStats::default(),
            injector: InjectorStats::default(),
        }
    }

    /// Observed share of emitted events carrying anomalies.
    pub fn anomaly_rate(&self) -> f64 {
        if self.total_emitted == 0 {
            0.0
        } else {
            self.total_anomalies as f64 / self.total_emitted as f64
        }
    }

    /// Logs the summary at `info` level.
    pub fn log(&self) {
        info!("==================== FINAL SUMMARY ====================");
        info!(
            "Run {}: {:?} ({})",
            self.run_tag,
            self.state,
            self.stop_reason
                .map(|reason| reason.as_str())
                .unwrap_or("not started")
        );
        info!(
            "Events emitted: {} ({} duplicates) from {} records, {} full cycles",
            self.total_emitted, self.duplicates_emitted, self.records_consumed, self.cycles_completed
        );
        info!(
            "Anomalies: {} ({:.1}%), configured rate {:.1}%",
            self.total_anomalies,
            self.anomaly_rate() * 100.0,
            self.injector.configured_rate * 100.0
        );
        info!(
            "Average latency: {:.1}ms (min: {:.1}ms, max: {:.1}ms), spikes: {} ({:.1}%)",
            self.latency.mean_ms,
            self.latency.min_ms,
            self.latency.max_ms,
            self.latency.spike_count,
            self.latency.spike_rate * 100.0
        );
        info!(
            "Publish failures: {} | Windows: {} | Runtime: {:.1}s",
            self.publish_failures, self.windows_closed, self.runtime_secs
        );
        info!("=======================================================");
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Totals
    pub summary: FinalSummary,
    /// Most recent complete windows, oldest first
    pub windows: Vec<WindowSummary>,
    /// Window still open at shutdown
    pub partial_window: Option<WindowSummary>,
}

impl RunReport {
    /// Events covered by the retained and partial windows.
    pub fn windowed_events(&self) -> usize {
        self.windows
            .iter()
            .chain(self.partial_window.iter())
            .map(|window| window.event_count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = FinalSummary::empty("00000000");
        assert_eq!(summary.total_emitted, 0);
        assert_eq!(summary.anomaly_rate(), 0.0);
        assert_eq!(summary.state, EngineState::Idle);
        summary.log();
    }

    #[test]
    fn test_summary_serialises() {
        let mut summary = FinalSummary::empty("cafef00d");
        summary.state = EngineState::StoppedByLimit;
        summary.stop_reason = Some(StopReason::CountReached);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["state"], "STOPPED_BY_LIMIT");
        assert_eq!(json["stop_reason"], "COUNT_REACHED");
        assert_eq!(json["latency"]["count"], 0);
    }
}
