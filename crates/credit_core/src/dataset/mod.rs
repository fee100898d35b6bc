//! The loaded dataset.
//!
//! [`Dataset`] is an ordered, immutable, cheaply cloneable sequence of
//! [`DatasetRecord`]s. It is never empty: construction fails instead, so
//! indexing modulo its length is always defined.

mod loader;

pub use loader::{normalise_column_name, DatasetLoader, REQUIRED_COLUMNS};

use serde::Serialize;
use std::sync::Arc;

use crate::error::DatasetLoadError;
use crate::types::DatasetRecord;

/// Ordered, shared, non-empty collection of dataset rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[DatasetRecord]>,
}

/// Summary statistics over the loaded rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatasetStats {
    /// Number of rows
    pub total_records: usize,
    /// Share of rows with the default label set
    pub default_rate: f64,
    /// Mean credit limit
    pub avg_credit_limit: f64,
    /// Mean age
    pub avg_age: f64,
}

impl Dataset {
    /// Wraps already-built records.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetLoadError::Empty`] when `records` is empty.
    pub fn from_records(records: Vec<DatasetRecord>) -> Result<Self, DatasetLoadError> {
        if records.is_empty() {
            return Err(DatasetLoadError::Empty {
                seen: 0,
                rejected: 0,
            });
        }
        Ok(Self {
            records: records.into(),
        })
    }

    /// Number of rows (always at least one).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&DatasetRecord> {
        self.records.get(index)
    }

    /// Row at `index` modulo the dataset length.
    pub fn cyclic(&self, index: usize) -> &DatasetRecord {
        &self.records[index % self.records.len()]
    }

    /// Iterates over the rows in original order.
    pub fn iter(&self) -> impl Iterator<Item = &DatasetRecord> {
        self.records.iter()
    }

    /// Computes summary statistics.
    pub fn stats(&self) -> DatasetStats {
        let n = self.records.len() as f64;
        let defaults = self.records.iter().filter(|r| r.default_next_month).count() as f64;
        let limit_sum: f64 = self.records.iter().map(|r| r.credit_limit as f64).sum();
        let age_sum: f64 = self.records.iter().map(|r| r.age as f64).sum();

        DatasetStats {
            total_records: self.records.len(),
            default_rate: defaults / n,
            avg_credit_limit: limit_sum / n,
            avg_age: age_sum / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::fixtures::sample_record;

    #[test]
    fn test_empty_dataset_rejected() {
        let result = Dataset::from_records(Vec::new());
        assert!(matches!(result, Err(DatasetLoadError::Empty { .. })));
    }

    #[test]
    fn test_cyclic_indexing() {
        let dataset =
            Dataset::from_records(vec![sample_record(1), sample_record(2), sample_record(3)])
                .unwrap();
        assert_eq!(dataset.cyclic(0).id, 1);
        assert_eq!(dataset.cyclic(4).id, 2);
        assert_eq!(dataset.cyclic(8).id, 3);
        assert!(dataset.get(3).is_none());
    }

    #[test]
    fn test_stats() {
        let mut defaulted = sample_record(2);
        defaulted.default_next_month = true;
        defaulted.credit_limit = 80_000;
        defaulted.age = 40;

        let dataset = Dataset::from_records(vec![sample_record(1), defaulted]).unwrap();
        let stats = dataset.stats();
        assert_eq!(stats.total_records, 2);
        assert!((stats.default_rate - 0.5).abs() < 1e-12);
        assert!((stats.avg_credit_limit - 100_000.0).abs() < 1e-9);
        assert!((stats.avg_age - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_clone_shares_records() {
        let dataset = Dataset::from_records(vec![sample_record(1)]).unwrap();
        let clone = dataset.clone();
        assert!(std::ptr::eq(dataset.cyclic(0), clone.cyclic(0)));
    }
}
