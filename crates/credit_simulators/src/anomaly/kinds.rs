//! Per-kind mutations.
//!
//! Every [`AnomalyKind`] carries an applicability check and a mutation. The
//! mutation edits the event in place, grades the injected values and
//! appends the resulting flag. Helpers are public so tests and tools can
//! inject one specific defect.

use credit_core::types::{
    AnomalyFlag, AnomalyKind, BankingEvent, Education, MonthlyValues, Severity,
};
use rand::Rng;

use super::grading::{
    grade_age, grade_credit_limit, grade_education_mismatch, grade_missing_fields,
    grade_overpayment, grade_payment_code,
};

/// Suffix appended to the identifier of a duplicate companion.
pub const DUPLICATE_SUFFIX: &str = "-DUP";

/// Result of applying one kind to an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// Flag appended to the event
    pub flag: AnomalyFlag,
    /// Replica to publish after the event (duplicate kind only)
    pub companion: Option<BankingEvent>,
}

/// Mutation associated with an anomaly kind.
pub trait AnomalyMutation {
    /// Whether the mutation can be applied to `event` as it stands.
    fn applies_to(&self, event: &BankingEvent) -> bool;

    /// Applies the mutation and appends its flag to `event`.
    ///
    /// Callers check [`applies_to`](AnomalyMutation::applies_to) first; an
    /// inapplicable mutation still leaves the event well-formed.
    fn mutate<R: Rng + ?Sized>(&self, event: &mut BankingEvent, rng: &mut R) -> Mutation;
}

impl AnomalyMutation for AnomalyKind {
    fn applies_to(&self, event: &BankingEvent) -> bool {
        match self {
            AnomalyKind::UnusualCreditLimit | AnomalyKind::PaymentPatternAnomaly => true,
            AnomalyKind::BillingMismatch => event.payment_amounts.is_some(),
            AnomalyKind::DemographicInconsistency => event.customer.demographic.age.is_some(),
            AnomalyKind::DuplicateEvent => !event.is_duplicate,
            AnomalyKind::MissingFields => {
                event.payment_amounts.is_some() || event.customer.demographic.age.is_some()
            }
        }
    }

    fn mutate<R: Rng + ?Sized>(&self, event: &mut BankingEvent, rng: &mut R) -> Mutation {
        let flag = match self {
            AnomalyKind::UnusualCreditLimit => set_credit_limit(event, rng),
            AnomalyKind::PaymentPatternAnomaly => force_payment_pattern(event, rng),
            AnomalyKind::BillingMismatch => distort_billing(event, rng),
            AnomalyKind::DemographicInconsistency => corrupt_demographic(event, rng),
            AnomalyKind::DuplicateEvent => duplicate_flag(),
            AnomalyKind::MissingFields => remove_fields(event, rng),
        };
        event.anomaly_flags.push(flag.clone());

        let companion = match self {
            AnomalyKind::DuplicateEvent => Some(duplicate_companion(event)),
            _ => None,
        };
        Mutation { flag, companion }
    }
}

/// Replaces the credit limit with a very high, near-zero or negative value.
pub fn set_credit_limit<R: Rng + ?Sized>(event: &mut BankingEvent, rng: &mut R) -> AnomalyFlag {
    let (limit, description) = match rng.gen_range(0..3) {
        0 => {
            let limit = rng.gen_range(5_000_000..=10_000_000);
            (limit, format!("Credit limit {} far exceeds the normal range", limit))
        }
        1 => {
            let limit = rng.gen_range(100..=1_000);
            (limit, format!("Credit limit {} below minimum threshold", limit))
        }
        _ => {
            let limit = rng.gen_range(-100_000..=-1_000);
            (limit, format!("Negative credit limit {}", limit))
        }
    };
    event.credit.credit_limit = limit;
    AnomalyFlag::new(
        AnomalyKind::UnusualCreditLimit,
        grade_credit_limit(limit),
        description,
    )
}

/// Forces every month of the payment history to one severe delay code.
pub fn force_payment_pattern<R: Rng + ?Sized>(
    event: &mut BankingEvent,
    rng: &mut R,
) -> AnomalyFlag {
    let code = rng.gen_range(5..=9);
    event.payment_history = MonthlyValues::uniform(code);
    AnomalyFlag::new(
        AnomalyKind::PaymentPatternAnomaly,
        grade_payment_code(code),
        format!("Payment status {} in all six months", code),
    )
}

/// Makes billing and payment amounts inconsistent.
///
/// Overpayment needs at least one positive bill; without one the event is
/// turned into a persistent non-payment instead.
pub fn distort_billing<R: Rng + ?Sized>(event: &mut BankingEvent, rng: &mut R) -> AnomalyFlag {
    let has_positive_bill = event.billing_amounts.iter().any(|bill| bill > 0);
    if has_positive_bill && rng.gen_bool(0.5) {
        force_overpayment(event, rng)
    } else {
        force_non_payment(event, rng)
    }
}

/// Sets each positively billed month's payment to 5-20 times the bill.
pub fn force_overpayment<R: Rng + ?Sized>(event: &mut BankingEvent, rng: &mut R) -> AnomalyFlag {
    let bills = event.billing_amounts.to_array();
    let payments = event
        .payment_amounts
        .get_or_insert_with(|| MonthlyValues::uniform(0));

    let mut max_ratio = 0_i64;
    for (payment, bill) in payments.values_mut().into_iter().zip(bills) {
        if bill > 0 {
            let ratio = rng.gen_range(5..=20);
            *payment = bill.saturating_mul(ratio);
            max_ratio = max_ratio.max(ratio);
        }
    }

    AnomalyFlag::new(
        AnomalyKind::BillingMismatch,
        grade_overpayment(max_ratio as f64),
        format!("Payments up to {}x the billed amount", max_ratio),
    )
}

/// Sets every bill to 50k-200k with nothing paid.
pub fn force_non_payment<R: Rng + ?Sized>(event: &mut BankingEvent, rng: &mut R) -> AnomalyFlag {
    for bill in event.billing_amounts.values_mut() {
        *bill = rng.gen_range(50_000..=200_000);
    }
    event.payment_amounts = Some(MonthlyValues::uniform(0));
    let total: i64 = event.billing_amounts.iter().sum();
    AnomalyFlag::new(
        AnomalyKind::BillingMismatch,
        Severity::High,
        format!("{} billed over six months with zero payments", total),
    )
}

/// Sets an impossible age or an education level inconsistent with age.
pub fn corrupt_demographic<R: Rng + ?Sized>(
    event: &mut BankingEvent,
    rng: &mut R,
) -> AnomalyFlag {
    match rng.gen_range(0..4) {
        0 => set_age(event, rng.gen_range(-50..=-1)),
        1 => set_age(event, rng.gen_range(5..=15)),
        2 => set_age(event, rng.gen_range(121..=200)),
        _ => set_graduate_education(event, rng.gen_range(12..=16)),
    }
}

/// Sets the age and grades it.
pub fn set_age(event: &mut BankingEvent, age: i32) -> AnomalyFlag {
    event.customer.demographic.age = Some(age);
    AnomalyFlag::new(
        AnomalyKind::DemographicInconsistency,
        grade_age(age),
        format!("Age {} is outside the valid range", age),
    )
}

/// Sets graduate-school education together with an implausibly young age.
pub fn set_graduate_education(event: &mut BankingEvent, age: i32) -> AnomalyFlag {
    event.customer.demographic.age = Some(age);
    event.customer.demographic.education = Education::GraduateSchool;
    AnomalyFlag::new(
        AnomalyKind::DemographicInconsistency,
        grade_education_mismatch(age),
        format!("Graduate school education at age {}", age),
    )
}

fn duplicate_flag() -> AnomalyFlag {
    AnomalyFlag::new(
        AnomalyKind::DuplicateEvent,
        Severity::Low,
        "Event re-emitted with identical payload",
    )
}

/// Builds the replica published after a duplicated event.
pub fn duplicate_companion(event: &BankingEvent) -> BankingEvent {
    let mut companion = event.clone();
    companion.event_id = format!("{}{}", event.event_id, DUPLICATE_SUFFIX);
    companion.is_duplicate = true;
    companion.duplicate_of = Some(event.event_id.clone());
    companion
}

/// Removes payment amounts and/or age, whichever are still present.
pub fn remove_fields<R: Rng + ?Sized>(event: &mut BankingEvent, rng: &mut R) -> AnomalyFlag {
    let has_payments = event.payment_amounts.is_some();
    let has_age = event.customer.demographic.age.is_some();

    let (drop_payments, drop_age) = match (has_payments, has_age) {
        (true, true) => match rng.gen_range(0..3) {
            0 => (true, false),
            1 => (false, true),
            _ => (true, true),
        },
        (payments, age) => (payments, age),
    };

    let mut removed = Vec::with_capacity(2);
    if drop_payments {
        event.payment_amounts = None;
        removed.push("payment_amounts");
    }
    if drop_age {
        event.customer.demographic.age = None;
        removed.push("age");
    }

    AnomalyFlag::new(
        AnomalyKind::MissingFields,
        grade_missing_fields(removed.len()),
        format!("Missing fields: {}", removed.join(", ")),
    )
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use credit_core::types::{
        BankingEvent, Credit, Customer, Demographic, Education, MaritalStatus, MonthlyValues,
        Risk, RiskLevel, Sex,
    };

    /// A clean mapped event with positive bills.
    pub fn sample_event() -> BankingEvent {
        BankingEvent {
            event_id: "EVT-0badf00d-0000-000001".to_string(),
            event_type: "CREDIT_ASSESSMENT".to_string(),
            timestamp: Utc::now(),
            source_system: "CREDIT_CARD_SYSTEM".to_string(),
            customer: Customer {
                customer_id: "CUST-000001".to_string(),
                demographic: Demographic {
                    sex: Sex::F,
                    education: Education::University,
                    marital_status: MaritalStatus::Married,
                    age: Some(24),
                },
            },
            credit: Credit {
                credit_limit: 20_000,
                currency: "TWD".to_string(),
            },
            payment_history: MonthlyValues::from_array([2, 2, -1, -1, -2, -2]),
            billing_amounts: MonthlyValues::from_array([3_913, 3_102, 689, 0, 0, 0]),
            payment_amounts: Some(MonthlyValues::from_array([0, 689, 0, 0, 0, 0])),
            risk: Risk {
                default_payment_next_month: 1,
                risk_level: RiskLevel::Medium,
            },
            anomaly_flags: Vec::new(),
            is_duplicate: false,
            duplicate_of: None,
            simulated_latency_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_event;
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_kind_applies_to_fresh_event() {
        let event = sample_event();
        for kind in AnomalyKind::ALL {
            assert!(kind.applies_to(&event), "{} should apply", kind);
        }
    }

    #[test]
    fn test_applicability_after_removal() {
        let mut event = sample_event();
        event.payment_amounts = None;
        event.customer.demographic.age = None;
        assert!(!AnomalyKind::BillingMismatch.applies_to(&event));
        assert!(!AnomalyKind::DemographicInconsistency.applies_to(&event));
        assert!(!AnomalyKind::MissingFields.applies_to(&event));
        assert!(AnomalyKind::UnusualCreditLimit.applies_to(&event));

        event.is_duplicate = true;
        assert!(!AnomalyKind::DuplicateEvent.applies_to(&event));
    }

    #[test]
    fn test_mutation_appends_matching_flag() {
        let mut rng = StdRng::seed_from_u64(11);
        for kind in AnomalyKind::ALL {
            let mut event = sample_event();
            let mutation = kind.mutate(&mut event, &mut rng);
            assert_eq!(mutation.flag.kind, kind);
            assert_eq!(event.anomaly_flags, vec![mutation.flag.clone()]);
            assert_eq!(mutation.companion.is_some(), kind == AnomalyKind::DuplicateEvent);
        }
    }

    #[test]
    fn test_credit_limit_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..300 {
            let mut event = sample_event();
            let flag = set_credit_limit(&mut event, &mut rng);
            let limit = event.credit.credit_limit;
            assert!(
                (5_000_000..=10_000_000).contains(&limit)
                    || (100..=1_000).contains(&limit)
                    || (-100_000..=-1_000).contains(&limit),
                "limit {} out of range",
                limit
            );
            let expected = if limit > 0 && limit <= 1_000 {
                Severity::Medium
            } else {
                Severity::High
            };
            assert_eq!(flag.severity, expected);
            assert!(flag.description.contains(&limit.to_string()));
        }
    }

    #[test]
    fn test_payment_pattern_single_code() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let mut event = sample_event();
            let flag = force_payment_pattern(&mut event, &mut rng);
            let codes = event.payment_history.to_array();
            assert!(codes.iter().all(|c| *c == codes[0]));
            assert!((5..=9).contains(&codes[0]));
            assert_eq!(flag.severity, grade_payment_code(codes[0]));
        }
    }

    #[test]
    fn test_overpayment_scales_positive_bills_only() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut event = sample_event();
        force_overpayment(&mut event, &mut rng);

        let bills = event.billing_amounts.to_array();
        let payments = event.payment_amounts.unwrap().to_array();
        for (bill, payment) in bills.iter().zip(payments.iter()) {
            if *bill > 0 {
                let ratio = payment / bill;
                assert!((5..=20).contains(&ratio));
                assert_eq!(payment % bill, 0);
            }
        }
        // months with zero bills keep their original payment
        assert_eq!(payments[3], 0);
    }

    #[test]
    fn test_non_payment_when_no_positive_bill() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..20 {
            let mut event = sample_event();
            event.billing_amounts = MonthlyValues::uniform(0);
            let flag = distort_billing(&mut event, &mut rng);
            assert_eq!(flag.severity, Severity::High);
            assert!(event.billing_amounts.iter().all(|b| (50_000..=200_000).contains(&b)));
            assert!(event.payment_amounts.unwrap().iter().all(|p| p == 0));
        }
    }

    #[test]
    fn test_age_150_is_high() {
        let mut event = sample_event();
        let flag = set_age(&mut event, 150);
        assert_eq!(flag.kind, AnomalyKind::DemographicInconsistency);
        assert_eq!(flag.severity, Severity::High);
        assert_eq!(event.customer.demographic.age, Some(150));
    }

    #[test]
    fn test_graduate_education_mismatch() {
        let mut event = sample_event();
        let flag = set_graduate_education(&mut event, 14);
        assert_eq!(event.customer.demographic.education, Education::GraduateSchool);
        assert_eq!(flag.severity, Severity::Medium);
        assert!(flag.description.contains("14"));
    }

    #[test]
    fn test_duplicate_companion() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut event = sample_event();
        let mutation = AnomalyKind::DuplicateEvent.mutate(&mut event, &mut rng);
        let companion = mutation.companion.unwrap();

        assert_eq!(companion.event_id, "EVT-0badf00d-0000-000001-DUP");
        assert_eq!(companion.duplicate_of.as_deref(), Some(event.event_id.as_str()));
        assert!(companion.is_duplicate);
        assert!(!event.is_duplicate);
        assert_eq!(companion.customer, event.customer);
        assert_eq!(companion.anomaly_flags, event.anomaly_flags);
        assert_eq!(mutation.flag.severity, Severity::Low);
    }

    #[test]
    fn test_remove_fields_grading() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let mut event = sample_event();
            let flag = remove_fields(&mut event, &mut rng);
            let removed = usize::from(event.payment_amounts.is_none())
                + usize::from(event.customer.demographic.age.is_none());
            assert!(removed >= 1);
            assert_eq!(flag.severity, grade_missing_fields(removed));
        }

        let mut event = sample_event();
        event.payment_amounts = None;
        let flag = remove_fields(&mut event, &mut rng);
        assert_eq!(flag.description, "Missing fields: age");
        assert_eq!(flag.severity, Severity::Medium);
    }
}
