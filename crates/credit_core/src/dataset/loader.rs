//! CSV dataset loader.
//!
//! Reads the credit-card default table once at startup. Column names are
//! normalised (`"default payment next month"`, `"default.payment.next.month"`
//! and `"DEFAULT_PAYMENT_NEXT_MONTH"` all resolve to the same column) and
//! every required cell is coerced to an integer. Rows that fail coercion are
//! rejected and counted; they never abort the load.

use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::Dataset;
use crate::error::DatasetLoadError;
use crate::types::DatasetRecord;

const LABEL_COLUMN: &str = "DEFAULT_PAYMENT_NEXT_MONTH";
const PAY_STATUS_COLUMNS: [&str; 6] = ["PAY_0", "PAY_2", "PAY_3", "PAY_4", "PAY_5", "PAY_6"];
const BILL_COLUMNS: [&str; 6] = [
    "BILL_AMT1",
    "BILL_AMT2",
    "BILL_AMT3",
    "BILL_AMT4",
    "BILL_AMT5",
    "BILL_AMT6",
];
const PAID_COLUMNS: [&str; 6] = [
    "PAY_AMT1", "PAY_AMT2", "PAY_AMT3", "PAY_AMT4", "PAY_AMT5", "PAY_AMT6",
];

/// Normalised names of every column the loader requires.
pub const REQUIRED_COLUMNS: [&str; 25] = [
    "ID",
    "LIMIT_BAL",
    "SEX",
    "EDUCATION",
    "MARRIAGE",
    "AGE",
    "PAY_0",
    "PAY_2",
    "PAY_3",
    "PAY_4",
    "PAY_5",
    "PAY_6",
    "BILL_AMT1",
    "BILL_AMT2",
    "BILL_AMT3",
    "BILL_AMT4",
    "BILL_AMT5",
    "BILL_AMT6",
    "PAY_AMT1",
    "PAY_AMT2",
    "PAY_AMT3",
    "PAY_AMT4",
    "PAY_AMT5",
    "PAY_AMT6",
    LABEL_COLUMN,
];

/// Spreadsheet extensions that must be exported to CSV first.
const BINARY_SHEET_EXTENSIONS: [&str; 4] = ["xls", "xlsx", "xlsm", "ods"];

/// Rejected rows logged individually before switching to a summary.
const MAX_REJECTION_WARNINGS: usize = 5;

/// Normalises a header cell to its canonical column name.
///
/// Non-alphanumeric runs collapse to a single underscore, letters are
/// upper-cased, and known aliases resolve to the canonical name.
///
/// # Examples
///
/// ```
/// use credit_core::dataset::normalise_column_name;
///
/// assert_eq!(normalise_column_name(" default payment next month "), "DEFAULT_PAYMENT_NEXT_MONTH");
/// assert_eq!(normalise_column_name("default.payment.next.month"), "DEFAULT_PAYMENT_NEXT_MONTH");
/// assert_eq!(normalise_column_name("pay_1"), "PAY_0");
/// assert_eq!(normalise_column_name("Limit Bal"), "LIMIT_BAL");
/// ```
pub fn normalise_column_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !name.is_empty() {
                name.push('_');
            }
            pending_separator = false;
            name.push(ch.to_ascii_uppercase());
        } else {
            pending_separator = true;
        }
    }

    match name.as_str() {
        "PAY_1" => "PAY_0".to_string(),
        "DEFAULT" | "DEFAULT_PAYMENT" => LABEL_COLUMN.to_string(),
        _ => name,
    }
}

/// Coerces a cell to an integer, accepting float notation (`"20000.0"`).
fn coerce_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() < i64::MAX as f64)
        .map(|value| value.round() as i64)
}

/// Cell positions of every required column.
#[derive(Debug, Clone)]
struct RowLayout {
    id: usize,
    limit: usize,
    sex: usize,
    education: usize,
    marriage: usize,
    age: usize,
    pay_status: [usize; 6],
    bills: [usize; 6],
    paid: [usize; 6],
    label: usize,
}

impl RowLayout {
    /// Resolves positions from a header row, or lists the missing columns.
    fn resolve(header: &StringRecord) -> Result<Self, Vec<String>> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            positions.entry(normalise_column_name(cell)).or_insert(idx);
        }

        let mut missing = Vec::new();
        let mut find = |name: &str| match positions.get(name) {
            Some(&idx) => idx,
            None => {
                missing.push(name.to_string());
                0
            }
        };

        let layout = RowLayout {
            id: find("ID"),
            limit: find("LIMIT_BAL"),
            sex: find("SEX"),
            education: find("EDUCATION"),
            marriage: find("MARRIAGE"),
            age: find("AGE"),
            pay_status: PAY_STATUS_COLUMNS.map(&mut find),
            bills: BILL_COLUMNS.map(&mut find),
            paid: PAID_COLUMNS.map(&mut find),
            label: find(LABEL_COLUMN),
        };

        if missing.is_empty() {
            Ok(layout)
        } else {
            Err(missing)
        }
    }

    /// Builds a record from a data row; `None` when any required cell fails coercion.
    fn parse(&self, row: &StringRecord) -> Option<DatasetRecord> {
        let int = |idx: usize| row.get(idx).and_then(coerce_integer);
        let small = |idx: usize| int(idx).and_then(|v| i32::try_from(v).ok());

        let default_next_month = match int(self.label)? {
            0 => false,
            1 => true,
            _ => return None,
        };

        let mut pay_status = [0i32; 6];
        for (slot, &idx) in pay_status.iter_mut().zip(&self.pay_status) {
            *slot = small(idx)?;
        }
        let mut bill_amounts = [0i64; 6];
        for (slot, &idx) in bill_amounts.iter_mut().zip(&self.bills) {
            *slot = int(idx)?;
        }
        let mut pay_amounts = [0i64; 6];
        for (slot, &idx) in pay_amounts.iter_mut().zip(&self.paid) {
            *slot = int(idx)?;
        }

        Some(DatasetRecord {
            id: u64::try_from(int(self.id)?).ok()?,
            credit_limit: int(self.limit)?,
            sex: small(self.sex)?,
            education: small(self.education)?,
            marriage: small(self.marriage)?,
            age: small(self.age)?,
            pay_status,
            bill_amounts,
            pay_amounts,
            default_next_month,
        })
    }
}

/// Loads the dataset from CSV.
///
/// # Examples
///
/// ```
/// use credit_core::DatasetLoader;
///
/// let csv = "\
/// ID,LIMIT_BAL,SEX,EDUCATION,MARRIAGE,AGE,PAY_0,PAY_2,PAY_3,PAY_4,PAY_5,PAY_6,\
/// BILL_AMT1,BILL_AMT2,BILL_AMT3,BILL_AMT4,BILL_AMT5,BILL_AMT6,\
/// PAY_AMT1,PAY_AMT2,PAY_AMT3,PAY_AMT4,PAY_AMT5,PAY_AMT6,default payment next month
/// 1,20000,2,2,1,24,2,2,-1,-1,-2,-2,3913,3102,689,0,0,0,0,689,0,0,0,0,1
/// ";
/// let dataset = DatasetLoader::new().load_from_reader(csv.as_bytes()).unwrap();
/// assert_eq!(dataset.len(), 1);
/// assert_eq!(dataset.cyclic(0).credit_limit, 20_000);
/// ```
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    delimiter: u8,
}

impl DatasetLoader {
    /// Creates a comma-delimited loader.
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Sets the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Loads the dataset at `path`.
    ///
    /// # Errors
    ///
    /// - [`DatasetLoadError::NotFound`] when the path does not exist
    /// - [`DatasetLoadError::UnsupportedFormat`] for binary spreadsheets
    /// - [`DatasetLoadError::Io`] when the file cannot be opened
    /// - any error from [`DatasetLoader::load_from_reader`]
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset, DatasetLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetLoadError::NotFound(path.to_path_buf()));
        }

        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            if BINARY_SHEET_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
                return Err(DatasetLoadError::UnsupportedFormat {
                    extension: extension.to_string(),
                });
            }
        }

        let file = File::open(path).map_err(|source| DatasetLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = self.load_from_reader(file)?;
        info!(
            "Dataset loaded: {} records from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Loads the dataset from any reader.
    ///
    /// A banner row above the real header (as in the published sheet, which
    /// carries `X1..X23, Y` first) is skipped automatically.
    ///
    /// # Errors
    ///
    /// - [`DatasetLoadError::Unreadable`] for malformed CSV
    /// - [`DatasetLoadError::MissingColumns`] when no header row supplies every required column
    /// - [`DatasetLoadError::Empty`] when no data row survives coercion
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Dataset, DatasetLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(self.delimiter)
            .from_reader(reader);
        let mut rows = reader.records();

        let first = match rows.next() {
            Some(row) => row?,
            None => return Err(DatasetLoadError::Empty { seen: 0, rejected: 0 }),
        };

        let layout = match RowLayout::resolve(&first) {
            Ok(layout) => layout,
            Err(missing) => match rows.next() {
                Some(second) => match RowLayout::resolve(&second?) {
                    Ok(layout) => {
                        debug!("Skipped banner row above dataset header");
                        layout
                    }
                    Err(_) => return Err(DatasetLoadError::MissingColumns(missing)),
                },
                None => return Err(DatasetLoadError::MissingColumns(missing)),
            },
        };

        let mut records = Vec::new();
        let mut seen = 0usize;
        let mut rejected = 0usize;

        for row in rows {
            let row = row?;
            if row.iter().all(str::is_empty) {
                continue;
            }
            seen += 1;

            match layout.parse(&row) {
                Some(record) => records.push(record),
                None => {
                    rejected += 1;
                    if rejected <= MAX_REJECTION_WARNINGS {
                        let line = row.position().map(|p| p.line()).unwrap_or_default();
                        warn!("Rejected dataset row at line {}: unparseable value", line);
                    }
                }
            }
        }

        if rejected > 0 {
            warn!("Rejected {} of {} dataset rows", rejected, seen);
        }

        if records.is_empty() {
            return Err(DatasetLoadError::Empty { seen, rejected });
        }

        Dataset::from_records(records)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}
