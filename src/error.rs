use thiserror::Error;

/// Failures while turning an uploaded file into a [`crate::table::RawTable`].
#[derive(Debug, Error)]
pub enum TableError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("file has no header row")]
    NoHeader,
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// A single row that could not be evaluated. The row is dropped; the batch continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("column '{column}' is not numeric: {value:?}")]
    NotNumeric { column: &'static str, value: String },
}

/// A stored field that could not be read as a number while building advice or statistics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericParseError {
    #[error("'{field}' is not a number: {value:?}")]
    Invalid { field: &'static str, value: String },
    #[error("cannot scale a deficit of {deficit} by a course weight of {weight}")]
    NegativeScale { deficit: f64, weight: f64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("no valid rows in upload")]
    NoValidRows,
    #[error("no data available")]
    NoData,
    #[error(transparent)]
    Table(#[from] TableError),
}
