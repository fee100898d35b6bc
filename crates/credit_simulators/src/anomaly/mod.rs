//! Synthetic anomaly injection.
//!
//! This module provides:
//! - `grading`: Severity rules by deviation from the valid domain
//! - `kinds`: The mutation and applicability check carried by each [`AnomalyKind`]
//! - [`AnomalyInjector`]: Bernoulli gate plus weighted kind selection
//!
//! One draw decides whether an event is degraded at all. When it fires a
//! kind is picked from the weight table; if that kind cannot be applied
//! (for example `MISSING_FIELDS` once both fields are gone) the following
//! kinds are tried in table order. If none applies the event passes through
//! unchanged and the attempt is counted as skipped.

pub mod grading;
pub mod kinds;

use credit_core::types::{AnomalyFlag, AnomalyKind, BankingEvent};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimulatorError;
pub use kinds::{AnomalyMutation, Mutation};

/// Default fraction of events degraded.
pub const DEFAULT_ANOMALY_RATE: f64 = 0.08;

fn default_weight() -> f64 {
    1.0
}

/// Relative selection weight of each kind.
///
/// Uniform by default. A zero weight disables the kind entirely, including
/// as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyWeights {
    /// `UNUSUAL_CREDIT_LIMIT`
    pub unusual_credit_limit: f64,
    /// `PAYMENT_PATTERN_ANOMALY`
    pub payment_pattern_anomaly: f64,
    /// `BILLING_MISMATCH`
    pub billing_mismatch: f64,
    /// `DEMOGRAPHIC_INCONSISTENCY`
    pub demographic_inconsistency: f64,
    /// `DUPLICATE_EVENT`
    pub duplicate_event: f64,
    /// `MISSING_FIELDS`
    pub missing_fields: f64,
}

impl Default for AnomalyWeights {
    fn default() -> Self {
        Self::uniform(default_weight())
    }
}

impl AnomalyWeights {
    /// Same weight for every kind.
    pub fn uniform(weight: f64) -> Self {
        Self::from_table([weight; 6])
    }

    /// Only `kind` selected.
    pub fn only(kind: AnomalyKind) -> Self {
        let mut table = [0.0; 6];
        table[kind.index()] = 1.0;
        Self::from_table(table)
    }

    /// Builds weights from a table in [`AnomalyKind::ALL`] order.
    pub fn from_table(table: [f64; 6]) -> Self {
        let [
            unusual_credit_limit,
            payment_pattern_anomaly,
            billing_mismatch,
            demographic_inconsistency,
            duplicate_event,
            missing_fields,
        ] = table;
        Self {
            unusual_credit_limit,
            payment_pattern_anomaly,
            billing_mismatch,
            demographic_inconsistency,
            duplicate_event,
            missing_fields,
        }
    }

    /// Weights in [`AnomalyKind::ALL`] order.
    pub fn to_table(&self) -> [f64; 6] {
        [
            self.unusual_credit_limit,
            self.payment_pattern_anomaly,
            self.billing_mismatch,
            self.demographic_inconsistency,
            self.duplicate_event,
            self.missing_fields,
        ]
    }

    /// Weight of `kind`.
    pub fn weight(&self, kind: AnomalyKind) -> f64 {
        self.to_table()[kind.index()]
    }

    /// Checks every weight is finite and non-negative with a positive sum.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        for kind in AnomalyKind::ALL {
            let weight = self.weight(kind);
            if !weight.is_finite() || weight < 0.0 {
                return Err(SimulatorError::InvalidWeights(format!(
                    "weight for {} is {}",
                    kind, weight
                )));
            }
        }
        if self.to_table().iter().sum::<f64>() <= 0.0 {
            return Err(SimulatorError::InvalidWeights(
                "at least one kind needs a positive weight".to_string(),
            ));
        }
        Ok(())
    }

    fn sampler(&self) -> Result<WeightedIndex<f64>, SimulatorError> {
        self.validate()?;
        WeightedIndex::new(self.to_table())
            .map_err(|e| SimulatorError::InvalidWeights(e.to_string()))
    }
}

/// Result of passing one event through the injector.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionOutcome {
    /// The event, mutated when a kind was applied
    pub event: BankingEvent,
    /// Flags added by this call
    pub flags: Vec<AnomalyFlag>,
    /// Duplicate replica to publish after `event`
    pub companion: Option<BankingEvent>,
    /// Kinds selected but not applicable to this event
    pub skipped: Vec<AnomalyKind>,
    /// Whether the rate draw fired
    pub attempted: bool,
}

impl InjectionOutcome {
    fn untouched(event: BankingEvent) -> Self {
        Self {
            event,
            flags: Vec::new(),
            companion: None,
            skipped: Vec::new(),
            attempted: false,
        }
    }

    /// Whether a kind was applied.
    pub fn is_injected(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Kind applied, if any.
    pub fn kind(&self) -> Option<AnomalyKind> {
        self.flags.first().map(|flag| flag.kind)
    }
}

/// Injector counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InjectorStats {
    /// Events passed through `inject`
    pub total_processed: u64,
    /// Events that received a flag
    pub anomalies_injected: u64,
    /// Inapplicable kind attempts
    pub kinds_skipped: u64,
    /// Draws that fired but found no applicable kind
    pub exhausted: u64,
    /// Injections per kind, in [`AnomalyKind::ALL`] order
    pub by_kind: [u64; 6],
    /// Rate the injector was built with
    pub configured_rate: f64,
}

impl InjectorStats {
    /// Observed fraction of processed events that were degraded.
    pub fn actual_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            self.anomalies_injected as f64 / self.total_processed as f64
        }
    }

    /// Injections of `kind`.
    pub fn count(&self, kind: AnomalyKind) -> u64 {
        self.by_kind[kind.index()]
    }
}

/// Injects anomalies into banking events.
///
/// # Examples
///
/// ```
/// use credit_simulators::anomaly::AnomalyInjector;
///
/// let injector = AnomalyInjector::new(0.08).unwrap().with_seed(7);
/// assert_eq!(injector.rate(), 0.08);
/// assert!(AnomalyInjector::new(1.5).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct AnomalyInjector {
    rate: f64,
    weights: AnomalyWeights,
    sampler: WeightedIndex<f64>,
    rng: StdRng,
    stats: InjectorStats,
}

impl AnomalyInjector {
    /// Creates an injector with uniform kind weights and an entropy-seeded
    /// random source.
    pub fn new(rate: f64) -> Result<Self, SimulatorError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(SimulatorError::InvalidRate(rate));
        }
        let weights = AnomalyWeights::default();
        Ok(Self {
            rate,
            sampler: weights.sampler()?,
            weights,
            rng: StdRng::from_entropy(),
            stats: InjectorStats {
                configured_rate: rate,
                ..InjectorStats::default()
            },
        })
    }

    /// Reseeds the random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Uses `rng` as the random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Replaces the kind weights.
    pub fn with_weights(mut self, weights: AnomalyWeights) -> Result<Self, SimulatorError> {
        self.sampler = weights.sampler()?;
        self.weights = weights;
        Ok(self)
    }

    /// Configured rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Configured weights.
    pub fn weights(&self) -> &AnomalyWeights {
        &self.weights
    }

    /// Counters so far.
    pub fn stats(&self) -> &InjectorStats {
        &self.stats
    }

    /// Passes `event` through the injector and counts the outcome.
    pub fn inject(&mut self, event: BankingEvent) -> InjectionOutcome {
        let outcome = self.draw(event);
        self.commit(&outcome);
        outcome
    }

    /// Passes `event` through the injector without touching the counters.
    ///
    /// The outcome is counted once handed to [`commit`](Self::commit); an
    /// outcome that is dropped instead leaves the stats as they were.
    pub fn draw(&mut self, mut event: BankingEvent) -> InjectionOutcome {
        if !self.rng.gen_bool(self.rate) {
            return InjectionOutcome::untouched(event);
        }

        let first = self.sampler.sample(&mut self.rng);
        let mut skipped = Vec::new();

        for offset in 0..AnomalyKind::ALL.len() {
            let kind = AnomalyKind::ALL[(first + offset) % AnomalyKind::ALL.len()];
            if self.weights.weight(kind) <= 0.0 {
                continue;
            }
            if !kind.applies_to(&event) {
                debug!(event_id = %event.event_id, kind = %kind, "Anomaly not applicable, trying next kind");
                skipped.push(kind);
                continue;
            }

            let Mutation { flag, companion } = kind.mutate(&mut event, &mut self.rng);
            debug!(
                event_id = %event.event_id,
                kind = %flag.kind,
                severity = %flag.severity,
                "Anomaly injected: {}",
                flag.description
            );
            return InjectionOutcome {
                event,
                flags: vec![flag],
                companion,
                skipped,
                attempted: true,
            };
        }

        debug!(event_id = %event.event_id, "No applicable anomaly kind, event passes unchanged");
        InjectionOutcome {
            event,
            flags: Vec::new(),
            companion: None,
            skipped,
            attempted: true,
        }
    }

    /// Counts an outcome returned by [`draw`](Self::draw).
    pub fn commit(&mut self, outcome: &InjectionOutcome) {
        self.stats.total_processed += 1;
        self.stats.kinds_skipped += outcome.skipped.len() as u64;
        match outcome.kind() {
            Some(kind) => {
                self.stats.anomalies_injected += 1;
                self.stats.by_kind[kind.index()] += 1;
            }
            None if outcome.attempted => self.stats.exhausted += 1,
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::kinds::fixtures::sample_event;
    use super::*;
    use credit_core::types::Severity;

    #[test]
    fn test_rejects_rate_out_of_range() {
        assert_eq!(
            AnomalyInjector::new(-0.1).unwrap_err(),
            SimulatorError::InvalidRate(-0.1)
        );
        assert!(AnomalyInjector::new(1.01).is_err());
        assert!(AnomalyInjector::new(f64::NAN).is_err());
        assert!(AnomalyInjector::new(0.0).is_ok());
        assert!(AnomalyInjector::new(1.0).is_ok());
    }

    #[test]
    fn test_rejects_bad_weights() {
        let injector = AnomalyInjector::new(0.5).unwrap();
        assert!(injector.clone().with_weights(AnomalyWeights::uniform(0.0)).is_err());
        let mut weights = AnomalyWeights::default();
        weights.billing_mismatch = -1.0;
        assert!(injector.with_weights(weights).is_err());
    }

    #[test]
    fn test_rate_zero_never_mutates() {
        let mut injector = AnomalyInjector::new(0.0).unwrap().with_seed(1);
        for _ in 0..1_000 {
            let original = sample_event();
            let outcome = injector.inject(original.clone());
            assert_eq!(outcome.event, original);
            assert!(!outcome.is_injected());
            assert!(outcome.companion.is_none());
        }
        assert_eq!(injector.stats().anomalies_injected, 0);
        assert_eq!(injector.stats().total_processed, 1_000);
    }

    #[test]
    fn test_rate_one_always_flags() {
        let mut injector = AnomalyInjector::new(1.0).unwrap().with_seed(2);
        for _ in 0..1_000 {
            let outcome = injector.inject(sample_event());
            assert_eq!(outcome.flags.len(), 1);
            assert!(AnomalyKind::ALL.contains(&outcome.flags[0].kind));
            assert_eq!(outcome.event.anomaly_flags, outcome.flags);
        }
        assert_eq!(injector.stats().anomalies_injected, 1_000);
        assert!((injector.stats().actual_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_uniform_weights_reach_every_kind() {
        let mut injector = AnomalyInjector::new(1.0).unwrap().with_seed(3);
        for _ in 0..600 {
            injector.inject(sample_event());
        }
        for kind in AnomalyKind::ALL {
            assert!(injector.stats().count(kind) > 50, "{} rarely chosen", kind);
        }
    }

    #[test]
    fn test_single_kind_weights() {
        let mut injector = AnomalyInjector::new(1.0)
            .unwrap()
            .with_seed(4)
            .with_weights(AnomalyWeights::only(AnomalyKind::DuplicateEvent))
            .unwrap();
        let outcome = injector.inject(sample_event());
        assert_eq!(outcome.kind(), Some(AnomalyKind::DuplicateEvent));
        assert!(outcome.companion.unwrap().is_duplicate);
    }

    #[test]
    fn test_inapplicable_kind_falls_through() {
        let mut weights = AnomalyWeights::uniform(0.0);
        weights.missing_fields = 1.0;
        weights.unusual_credit_limit = 0.0;
        weights.payment_pattern_anomaly = 0.0;
        let mut injector = AnomalyInjector::new(1.0)
            .unwrap()
            .with_seed(5)
            .with_weights(weights)
            .unwrap();

        let mut event = sample_event();
        event.payment_amounts = None;
        event.customer.demographic.age = None;
        let outcome = injector.inject(event.clone());

        assert!(!outcome.is_injected());
        assert_eq!(outcome.skipped, vec![AnomalyKind::MissingFields]);
        assert_eq!(outcome.event, event);
        assert_eq!(injector.stats().exhausted, 1);
        assert_eq!(injector.stats().kinds_skipped, 1);
    }

    #[test]
    fn test_fallback_tries_following_kinds() {
        let mut weights = AnomalyWeights::uniform(0.0);
        weights.missing_fields = 100.0;
        weights.unusual_credit_limit = 1e-9;
        let mut injector = AnomalyInjector::new(1.0)
            .unwrap()
            .with_seed(6)
            .with_weights(weights)
            .unwrap();

        let mut event = sample_event();
        event.payment_amounts = None;
        event.customer.demographic.age = None;
        let outcome = injector.inject(event);

        assert_eq!(outcome.kind(), Some(AnomalyKind::UnusualCreditLimit));
        assert_eq!(outcome.skipped, vec![AnomalyKind::MissingFields]);
    }

    #[test]
    fn test_draw_counts_only_on_commit() {
        let mut injector = AnomalyInjector::new(1.0).unwrap().with_seed(8);
        let dropped = injector.draw(sample_event());
        assert!(dropped.is_injected());
        assert_eq!(injector.stats().total_processed, 0);
        assert_eq!(injector.stats().anomalies_injected, 0);

        let kept = injector.draw(sample_event());
        injector.commit(&kept);
        assert_eq!(injector.stats().total_processed, 1);
        assert_eq!(injector.stats().anomalies_injected, 1);
        assert_eq!(injector.stats().count(kept.kind().unwrap()), 1);
    }

    #[test]
    fn test_rate_zero_commit_is_not_exhausted() {
        let mut injector = AnomalyInjector::new(0.0).unwrap().with_seed(9);
        let outcome = injector.draw(sample_event());
        assert!(!outcome.attempted);
        injector.commit(&outcome);
        assert_eq!(injector.stats().total_processed, 1);
        assert_eq!(injector.stats().exhausted, 0);
    }

    #[test]
    fn test_seeded_injectors_agree() {
        let mut a = AnomalyInjector::new(0.5).unwrap().with_seed(99);
        let mut b = AnomalyInjector::new(0.5).unwrap().with_seed(99);
        for _ in 0..200 {
            let event = sample_event();
            let left = a.inject(event.clone());
            let right = b.inject(event);
            assert_eq!(left.event, right.event);
        }
    }

    #[test]
    fn test_flag_severity_is_graded() {
        let mut injector = AnomalyInjector::new(1.0)
            .unwrap()
            .with_seed(10)
            .with_weights(AnomalyWeights::only(AnomalyKind::DuplicateEvent))
            .unwrap();
        let outcome = injector.inject(sample_event());
        assert_eq!(outcome.event.highest_severity(), Some(Severity::Low));
    }

    #[test]
    fn test_weights_deserialise_with_defaults() {
        let weights: AnomalyWeights =
            serde_json::from_str(r#"{"duplicate_event": 0.0, "missing_fields": 3.0}"#).unwrap();
        assert_eq!(weights.duplicate_event, 0.0);
        assert_eq!(weights.missing_fields, 3.0);
        assert_eq!(weights.unusual_credit_limit, 1.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn test_injected_events_keep_identity(seed in any::<u64>(), rate in 0.0f64..=1.0) {
                let mut injector = AnomalyInjector::new(rate).unwrap().with_seed(seed);
                let original = sample_event();
                let outcome = injector.inject(original.clone());
                prop_assert_eq!(&outcome.event.event_id, &original.event_id);
                prop_assert_eq!(&outcome.event.customer.customer_id, &original.customer.customer_id);
                prop_assert_eq!(outcome.event.risk_level(), original.risk_level());
                prop_assert!(outcome.flags.len() <= 1);
            }
        }
    }
}
