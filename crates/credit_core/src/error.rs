//! Error types for dataset loading.
//!
//! A failed load is fatal for the simulator: without records there is
//! nothing to cycle through, so every variant is reported at startup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the source dataset.
///
/// # Examples
/// ```
/// use credit_core::DatasetLoadError;
///
/// let err = DatasetLoadError::MissingColumns(vec!["AGE".to_string(), "PAY_0".to_string()]);
/// assert_eq!(err.to_string(), "Dataset is missing required columns: AGE, PAY_0");
/// ```
#[derive(Debug, Error)]
pub enum DatasetLoadError {
    /// The dataset path does not exist
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The dataset exists but could not be opened
    #[error("Dataset could not be opened: {}: {source}", .path.display())]
    Io {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file is in a format the loader does not parse
    #[error("Unsupported dataset format '{extension}': export the sheet as CSV")]
    UnsupportedFormat {
        /// File extension as found on the path
        extension: String,
    },

    /// The CSV stream is malformed
    #[error("Dataset could not be read: {0}")]
    Unreadable(#[from] csv::Error),

    /// Required columns are absent from the header
    #[error("Dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// No row survived sanitisation
    #[error("Dataset has no usable rows ({rejected} of {seen} rows rejected)")]
    Empty {
        /// Data rows read after the header
        seen: usize,
        /// Rows rejected during type coercion
        rejected: usize,
    },
}
