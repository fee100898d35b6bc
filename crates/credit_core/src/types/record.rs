//! Dataset rows.
//!
//! A [`DatasetRecord`] is one row of the credit-card default table. Monthly
//! series are stored most recent first (September back to April), matching
//! the column order `PAY_0, PAY_2..PAY_6`, `BILL_AMT1..6` and `PAY_AMT1..6`.

use serde::{Deserialize, Serialize};

use super::risk::RiskLevel;

/// Month names in series order, most recent first.
pub const MONTH_NAMES: [&str; 6] = ["september", "august", "july", "june", "may", "april"];

/// Six named monthly values, most recent month first.
///
/// # Examples
///
/// ```
/// use credit_core::types::MonthlyValues;
///
/// let bills = MonthlyValues::from_array([10, 20, 30, 40, 50, 60]);
/// assert_eq!(bills.september, 10);
/// assert_eq!(bills.april, 60);
/// assert_eq!(bills.iter().sum::<i64>(), 210);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyValues<T> {
    /// September value
    pub september: T,
    /// August value
    pub august: T,
    /// July value
    pub july: T,
    /// June value
    pub june: T,
    /// May value
    pub may: T,
    /// April value
    pub april: T,
}

impl<T: Copy> MonthlyValues<T> {
    /// Builds the series from an array ordered September to April.
    pub fn from_array(values: [T; 6]) -> Self {
        let [september, august, july, june, may, april] = values;
        Self {
            september,
            august,
            july,
            june,
            may,
            april,
        }
    }

    /// Same value for every month.
    pub fn uniform(value: T) -> Self {
        Self::from_array([value; 6])
    }

    /// Returns the series as an array ordered September to April.
    pub fn to_array(&self) -> [T; 6] {
        [
            self.september,
            self.august,
            self.july,
            self.june,
            self.may,
            self.april,
        ]
    }

    /// Iterates over the values, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = T> {
        self.to_array().into_iter()
    }

    /// Mutable references to every month, most recent first.
    pub fn values_mut(&mut self) -> [&mut T; 6] {
        [
            &mut self.september,
            &mut self.august,
            &mut self.july,
            &mut self.june,
            &mut self.may,
            &mut self.april,
        ]
    }
}

/// One immutable row of the source dataset.
///
/// Categorical fields keep their raw codes; decoding happens when the row is
/// mapped to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    /// Row identifier (`ID`)
    pub id: u64,
    /// Granted credit (`LIMIT_BAL`)
    pub credit_limit: i64,
    /// Sex code (`SEX`, 1 = male)
    pub sex: i32,
    /// Education code (`EDUCATION`)
    pub education: i32,
    /// Marital status code (`MARRIAGE`)
    pub marriage: i32,
    /// Age in years (`AGE`)
    pub age: i32,
    /// Repayment status per month (`PAY_0, PAY_2..PAY_6`); positive values are months of delay
    pub pay_status: [i32; 6],
    /// Bill statement amounts (`BILL_AMT1..6`)
    pub bill_amounts: [i64; 6],
    /// Amounts paid (`PAY_AMT1..6`)
    pub pay_amounts: [i64; 6],
    /// Default label (`default payment next month`)
    pub default_next_month: bool,
}

impl DatasetRecord {
    /// Risk level derived from the default label and repayment history.
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::assess(self.default_next_month, &self.pay_status)
    }

    /// Customer identifier used as the stream partition key.
    pub fn customer_id(&self) -> String {
        format!("CUST-{:06}", self.id)
    }
}
