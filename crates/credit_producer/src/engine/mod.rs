//! Simulation orchestrator.
//!
//! Drives one sequential loop over the dataset:
//! pull record → map → inject → sample latency → wait → publish → aggregate.
//!
//! The only suspension point is the pacing wait, which races the
//! cancellation token so a pending delay is abandoned immediately and the
//! in-flight event is discarded before it reaches the transport. Limits are
//! checked at iteration boundaries.

mod cancel;
mod summary;

pub use cancel::CancelToken;
pub use summary::{FinalSummary, RunReport};

use chrono::{Local, Timelike};
use credit_core::types::BankingEvent;
use credit_core::Dataset;
use credit_simulators::anomaly::AnomalyInjector;
use credit_simulators::latency::LatencySimulator;
use credit_simulators::mapper::EventMapper;
use credit_simulators::rng::{stream_rng, RngStream};
use credit_simulators::window::{WindowAggregator, WindowSummary};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ProducerConfig, DEFAULT_MAX_DURATION_SECS};
use crate::error::{ProducerError, Result};
use crate::transport::EventTransport;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    /// Built, not yet run
    Idle,
    /// Inside `run`
    Running,
    /// Stopped by the duration or count limit
    StoppedByLimit,
    /// Stopped by cancellation
    StoppedBySignal,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    /// Maximum run time reached
    DurationElapsed,
    /// Event count limit reached
    CountReached,
    /// Cancellation requested
    Cancelled,
}

impl StopReason {
    /// Short label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::DurationElapsed => "duration elapsed",
            StopReason::CountReached => "count reached",
            StopReason::Cancelled => "cancelled",
        }
    }

    /// Terminal state this reason leads to.
    pub fn terminal_state(&self) -> EngineState {
        match self {
            StopReason::DurationElapsed | StopReason::CountReached => EngineState::StoppedByLimit,
            StopReason::Cancelled => EngineState::StoppedBySignal,
        }
    }
}

/// Bounds of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Wall-clock bound, measured on the monotonic clock
    pub max_duration: Duration,
    /// Stop once this many events have been published
    pub event_count_limit: Option<u64>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(DEFAULT_MAX_DURATION_SECS),
            event_count_limit: None,
        }
    }
}

impl RunLimits {
    /// Limits with only a duration bound.
    pub fn new(max_duration: Duration) -> Self {
        Self {
            max_duration,
            event_count_limit: None,
        }
    }

    /// Adds an event count bound.
    pub fn with_event_count(mut self, count: u64) -> Self {
        self.event_count_limit = Some(count);
        self
    }
}

/// Callback invoked with every window summary.
pub type WindowCallback = Arc<dyn Fn(&WindowSummary) + Send + Sync>;

#[derive(Debug, Default)]
struct Counters {
    total_emitted: u64,
    total_anomalies: u64,
    duplicates_emitted: u64,
    records_consumed: u64,
    publish_failures: u64,
}

/// The simulation engine.
pub struct SimulationEngine {
    dataset: Dataset,
    mapper: EventMapper,
    injector: AnomalyInjector,
    latency: LatencySimulator,
    aggregator: WindowAggregator,
    transport: Arc<dyn EventTransport>,
    time_scale: f64,
    retained_windows: usize,
    windows: VecDeque<WindowSummary>,
    on_window: Option<WindowCallback>,
    cancel: CancelToken,
    state: EngineState,
    counters: Counters,
}

impl SimulationEngine {
    /// Builds an engine from validated configuration.
    ///
    /// With `run.seed` set every random source is derived from it, so two
    /// engines built from the same configuration produce the same events.
    pub fn from_config(
        config: &ProducerConfig,
        dataset: Dataset,
        transport: Arc<dyn EventTransport>,
    ) -> Result<Self> {
        config.validate()?;
        let seed = config.run.seed;

        let mapper = EventMapper::with_random_tag(&mut stream_rng(seed, RngStream::RunTag));

        let anomaly_rng = match config.anomaly.seed {
            Some(anomaly_seed) => StdRng::seed_from_u64(anomaly_seed),
            None => stream_rng(seed, RngStream::Anomaly),
        };
        let injector = AnomalyInjector::new(config.anomaly.rate)?
            .with_weights(config.anomaly.weights)?
            .with_rng(anomaly_rng);

        let profile = config.network_profile(Local::now().hour())?;
        let latency =
            LatencySimulator::new(profile)?.with_rng(stream_rng(seed, RngStream::Latency));

        let aggregator = WindowAggregator::new(config.window.capacity)?;

        Ok(Self {
            dataset,
            mapper,
            injector,
            latency,
            aggregator,
            transport,
            time_scale: config.run.time_scale,
            retained_windows: config.window.retained,
            windows: VecDeque::new(),
            on_window: None,
            cancel: CancelToken::new(),
            state: EngineState::Idle,
            counters: Counters::default(),
        })
    }

    /// Replaces the event mapper.
    pub fn with_mapper(mut self, mapper: EventMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Replaces the anomaly injector.
    pub fn with_injector(mut self, injector: AnomalyInjector) -> Self {
        self.injector = injector;
        self
    }

    /// Replaces the latency simulator.
    pub fn with_latency(mut self, latency: LatencySimulator) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the pacing scale (1.0 real time, 0.0 no wait).
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = if time_scale.is_finite() {
            time_scale.max(0.0)
        } else {
            0.0
        };
        self
    }

    /// Keeps at most `retained` closed window summaries in the report.
    pub fn with_retained_windows(mut self, retained: usize) -> Self {
        self.retained_windows = retained;
        self
    }

    /// Calls `callback` with every window summary.
    pub fn with_window_callback(mut self, callback: WindowCallback) -> Self {
        self.on_window = Some(callback);
        self
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops this engine.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run tag embedded in event identifiers.
    pub fn run_tag(&self) -> &str {
        self.mapper.run_tag()
    }

    /// Runs until a limit is reached or the token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError::InvalidState`] unless the engine is idle.
    /// Publish failures are not errors; they are counted in the report.
    pub async fn run(&mut self, limits: RunLimits) -> Result<RunReport> {
        if self.state != EngineState::Idle {
            return Err(ProducerError::InvalidState(self.state));
        }
        self.state = EngineState::Running;

        info!(
            run_tag = %self.run_tag(),
            stream = %self.transport.name(),
            records = self.dataset.len(),
            anomaly_rate = self.injector.rate(),
            profile = %self.latency.profile().name,
            "Simulation started (max {:?}, limit {:?})",
            limits.max_duration,
            limits.event_count_limit
        );

        let started = Instant::now();
        let deadline = started.checked_add(limits.max_duration);

        let reason = loop {
            if let Some(reason) = self.check_limits(&limits, deadline) {
                break reason;
            }

            let records = self.dataset.len() as u64;
            let cycle_index = self.counters.records_consumed / records;
            let record_index = (self.counters.records_consumed % records) as usize;
            let record = self.dataset.cyclic(record_index);

            let event = self.mapper.map(record, cycle_index, record_index);
            // Counted only once the pacing wait completes
            let outcome = self.injector.draw(event);
            let sample = self.latency.draw_delay();
            if sample.spiked {
                warn!(
                    event_id = %outcome.event.event_id,
                    "Latency spike: {:.1}ms", sample.delay_ms
                );
            }

            let wait = sample.pacing(self.time_scale);
            if wait.is_zero() {
                tokio::task::yield_now().await;
            } else {
                let cancel = self.cancel.clone();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = cancel.cancelled() => {
                        debug!(event_id = %outcome.event.event_id, "Cancelled during pacing, event discarded");
                        break StopReason::Cancelled;
                    }
                }
            }

            self.injector.commit(&outcome);
            self.latency.record(&sample);
            self.counters.records_consumed += 1;

            let mut primary = outcome.event;
            primary.simulated_latency_ms = Some(sample.delay_ms);
            self.publish(&primary).await;

            if let Some(mut companion) = outcome.companion {
                let within_limit = limits
                    .event_count_limit
                    .map_or(true, |limit| self.counters.total_emitted < limit);
                if within_limit {
                    companion.simulated_latency_ms = Some(sample.delay_ms);
                    if self.publish(&companion).await {
                        self.counters.duplicates_emitted += 1;
                    }
                } else {
                    debug!(event_id = %companion.event_id, "Duplicate companion dropped at count limit");
                }
            }
        };

        let partial_window = self.aggregator.flush();
        if let Some(partial) = &partial_window {
            self.announce_window(partial);
        }

        self.state = reason.terminal_state();
        let summary = FinalSummary {
            run_tag: self.run_tag().to_string(),
            state: self.state,
            stop_reason: Some(reason),
            total_emitted: self.counters.total_emitted,
            total_anomalies: self.counters.total_anomalies,
            duplicates_emitted: self.counters.duplicates_emitted,
            records_consumed: self.counters.records_consumed,
            cycles_completed: self.counters.records_consumed / self.dataset.len() as u64,
            publish_failures: self.counters.publish_failures,
            runtime_secs: started.elapsed().as_secs_f64(),
            windows_closed: self.aggregator.windows_closed(),
            latency: self.latency.stats(),
            injector: self.injector.stats().clone(),
        };

        if let Err(e) = self.transport.flush().await {
            warn!("Transport flush failed: {}", e);
        }

        info!("Simulation stopped: {}", reason.as_str());
        Ok(RunReport {
            summary,
            windows: self.windows.drain(..).collect(),
            partial_window,
        })
    }

    fn check_limits(&self, limits: &RunLimits, deadline: Option<Instant>) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        if let Some(limit) = limits.event_count_limit {
            if self.counters.total_emitted >= limit {
                return Some(StopReason::CountReached);
            }
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(StopReason::DurationElapsed);
        }
        None
    }

    /// Publishes one event and aggregates it on success.
    async fn publish(&mut self, event: &BankingEvent) -> bool {
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event_id = %event.event_id, "Event serialisation failed: {}", e);
                self.counters.publish_failures += 1;
                return false;
            }
        };

        match self
            .transport
            .publish(&event.event_id, event.partition_key(), &payload)
            .await
        {
            Ok(marker) => {
                self.counters.total_emitted += 1;
                if event.has_anomalies() {
                    self.counters.total_anomalies += 1;
                }
                debug!(
                    event_id = %event.event_id,
                    customer = %event.partition_key(),
                    risk = %event.risk_level(),
                    sequence = marker.sequence_number,
                    anomalies = event.anomaly_flags.len(),
                    "Event published"
                );
                if let Some(summary) = self.aggregator.observe(event) {
                    self.announce_window(&summary);
                    if self.retained_windows > 0 {
                        if self.windows.len() == self.retained_windows {
                            self.windows.pop_front();
                        }
                        self.windows.push_back(summary);
                    }
                }
                true
            }
            Err(e) => {
                warn!(event_id = %event.event_id, "Publish failed: {}", e);
                self.counters.publish_failures += 1;
                false
            }
        }
    }

    fn announce_window(&self, summary: &WindowSummary) {
        info!(
            "Window {}{}: {} events | Risk L/M/H {}/{}/{} | Anomalies: {} ({:.1}%) | Avg latency {:.1}ms | Avg limit {:.0}",
            summary.window_index,
            if summary.complete { "" } else { " (partial)" },
            summary.event_count,
            summary.low_risk,
            summary.medium_risk,
            summary.high_risk,
            summary.anomaly_count,
            summary.anomaly_rate * 100.0,
            summary.avg_latency_ms,
            summary.avg_credit_limit
        );
        if let Some(callback) = &self.on_window {
            callback(summary);
        }
    }
}
