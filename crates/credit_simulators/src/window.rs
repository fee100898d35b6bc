//! Count-based tumbling window statistics.
//!
//! A window closes after exactly `capacity` observations. Closing returns a
//! [`WindowSummary`] and opens the next window, so no event is ever counted
//! twice or dropped. Events are not retained; only running sums are kept.

use chrono::{DateTime, Utc};
use credit_core::types::{BankingEvent, RiskLevel};
use serde::Serialize;

use crate::error::SimulatorError;

/// Default number of events per window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

/// Statistics of one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    /// Zero-based window position within the run
    pub window_index: u64,
    /// Events observed
    pub event_count: usize,
    /// LOW risk events
    pub low_risk: usize,
    /// MEDIUM risk events
    pub medium_risk: usize,
    /// HIGH risk events
    pub high_risk: usize,
    /// Events carrying at least one anomaly flag
    pub anomaly_count: usize,
    /// `anomaly_count / event_count`
    pub anomaly_rate: f64,
    /// Mean simulated latency over events that carry one
    pub avg_latency_ms: f64,
    /// Mean credit limit
    pub avg_credit_limit: f64,
    /// Timestamp of the first event
    pub first_timestamp: DateTime<Utc>,
    /// Timestamp of the last event
    pub last_timestamp: DateTime<Utc>,
    /// False for a partial window returned by [`WindowAggregator::flush`]
    pub complete: bool,
}

impl WindowSummary {
    /// Events at `level`.
    pub fn risk_count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low_risk,
            RiskLevel::Medium => self.medium_risk,
            RiskLevel::High => self.high_risk,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Window {
    count: usize,
    risk_counts: [usize; 3],
    anomalies: usize,
    latency_sum: f64,
    latency_count: usize,
    credit_limit_sum: f64,
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
}

impl Window {
    fn add(&mut self, event: &BankingEvent) {
        self.count += 1;
        let slot = match event.risk_level() {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        };
        self.risk_counts[slot] += 1;
        if event.has_anomalies() {
            self.anomalies += 1;
        }
        if let Some(latency) = event.simulated_latency_ms {
            self.latency_sum += latency;
            self.latency_count += 1;
        }
        self.credit_limit_sum += event.credit.credit_limit as f64;
        self.first.get_or_insert(event.timestamp);
        self.last = Some(event.timestamp);
    }

    fn summarise(&self, window_index: u64, complete: bool) -> Option<WindowSummary> {
        let (first, last) = (self.first?, self.last?);
        let n = self.count as f64;
        Some(WindowSummary {
            window_index,
            event_count: self.count,
            low_risk: self.risk_counts[0],
            medium_risk: self.risk_counts[1],
            high_risk: self.risk_counts[2],
            anomaly_count: self.anomalies,
            anomaly_rate: self.anomalies as f64 / n,
            avg_latency_ms: if self.latency_count > 0 {
                self.latency_sum / self.latency_count as f64
            } else {
                0.0
            },
            avg_credit_limit: self.credit_limit_sum / n,
            first_timestamp: first,
            last_timestamp: last,
            complete,
        })
    }
}

/// Aggregates events into consecutive fixed-size windows.
///
/// # Examples
///
/// ```
/// use credit_simulators::window::WindowAggregator;
///
/// let aggregator = WindowAggregator::new(20).unwrap();
/// assert_eq!(aggregator.capacity(), 20);
/// assert!(WindowAggregator::new(0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    capacity: usize,
    current: Window,
    index: u64,
    closed: u64,
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
            current: Window::default(),
            index: 0,
            closed: 0,
        }
    }
}

impl WindowAggregator {
    /// Creates an aggregator closing windows every `capacity` events.
    pub fn new(capacity: usize) -> Result<Self, SimulatorError> {
        if capacity == 0 {
            return Err(SimulatorError::ZeroWindowCapacity);
        }
        Ok(Self {
            capacity,
            ..Self::default()
        })
    }

    /// Events per window.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events in the open window.
    pub fn pending(&self) -> usize {
        self.current.count
    }

    /// Windows closed so far.
    pub fn windows_closed(&self) -> u64 {
        self.closed
    }

    /// Adds `event` to the open window, returning its summary when this
    /// observation fills it.
    pub fn observe(&mut self, event: &BankingEvent) -> Option<WindowSummary> {
        self.current.add(event);
        if self.current.count < self.capacity {
            return None;
        }
        let summary = self.current.summarise(self.index, true);
        self.rotate();
        summary
    }

    /// Closes the open window early, returning its summary if it holds any
    /// events.
    pub fn flush(&mut self) -> Option<WindowSummary> {
        let summary = self.current.summarise(self.index, false);
        if summary.is_some() {
            self.rotate();
        }
        summary
    }

    fn rotate(&mut self) {
        self.current = Window::default();
        self.index += 1;
        self.closed += 1;
    }
}
