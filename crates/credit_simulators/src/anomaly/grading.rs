//! Severity grading by deviation from the valid domain.

use credit_core::types::Severity;

/// Oldest plausible customer age.
pub const MAX_PLAUSIBLE_AGE: i32 = 120;

/// Age of majority; younger customers are graded `MEDIUM`.
pub const ADULT_AGE: i32 = 18;

/// Largest credit limit found in the dataset.
pub const MAX_TYPICAL_CREDIT_LIMIT: i64 = 1_000_000;

/// Smallest credit limit found in the dataset.
pub const MIN_TYPICAL_CREDIT_LIMIT: i64 = 10_000;

/// Multiple of the typical maximum at which a limit becomes `HIGH`.
pub const EXTREME_LIMIT_FACTOR: i64 = 5;

/// Payment status from which a forced pattern is graded `HIGH`.
pub const SEVERE_PAYMENT_CODE: i32 = 7;

/// Payment-to-bill ratio from which an overpayment is graded `HIGH`.
pub const EXTREME_OVERPAYMENT_RATIO: f64 = 10.0;

/// Grades an age value.
///
/// Zero, negative and over-120 ages are impossible; minors are unusual for
/// a credit card holder.
pub fn grade_age(age: i32) -> Severity {
    if age <= 0 || age > MAX_PLAUSIBLE_AGE {
        Severity::High
    } else if age < ADULT_AGE {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Grades a credit limit.
pub fn grade_credit_limit(limit: i64) -> Severity {
    if limit < 0 || limit >= EXTREME_LIMIT_FACTOR * MAX_TYPICAL_CREDIT_LIMIT {
        Severity::High
    } else if limit > MAX_TYPICAL_CREDIT_LIMIT || limit < MIN_TYPICAL_CREDIT_LIMIT {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Grades a forced payment status code.
pub fn grade_payment_code(code: i32) -> Severity {
    if code >= SEVERE_PAYMENT_CODE {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Grades an overpayment by its payment-to-bill ratio.
pub fn grade_overpayment(ratio: f64) -> Severity {
    if ratio >= EXTREME_OVERPAYMENT_RATIO {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Grades an education level held at an implausible age.
pub fn grade_education_mismatch(age: i32) -> Severity {
    grade_age(age).max(Severity::Medium)
}

/// Grades the removal of `removed` fields.
pub fn grade_missing_fields(removed: usize) -> Severity {
    if removed >= 2 {
        Severity::High
    } else {
        Severity::Medium
    }
}
