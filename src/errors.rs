//! Error types for recurrence feature extraction

use thiserror::Error;

/// Result type alias for consistent error handling throughout the crate
pub type Result<T> = std::result::Result<T, RecurScanError>;

/// Main error type for recurrence feature extraction operations
#[derive(Debug, Error)]
pub enum RecurScanError {
    /// Date string did not match the accepted `YYYY-MM-DD` format
    #[error("Date parsing error: {0}")]
    DateParsing(#[from] chrono::ParseError),

    /// Numeric field (amount, id) failed to parse
    #[error("Number parsing error: {0}")]
    NumberParsing(String),

    /// A CSV row is missing a required column or carries malformed data
    #[error("Malformed transaction record at row {row}: {message}")]
    MalformedRecord { row: usize, message: String },

    /// CSV processing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<std::num::ParseFloatError> for RecurScanError {
    fn from(err: std::num::ParseFloatError) -> Self {
        RecurScanError::NumberParsing(err.to_string())
    }
}

impl From<std::num::ParseIntError> for RecurScanError {
    fn from(err: std::num::ParseIntError) -> Self {
        RecurScanError::NumberParsing(err.to_string())
    }
}

impl RecurScanError {
    /// Create a new validation error with context
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new malformed-record error with row context
    pub fn malformed_record(row: usize, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            row,
            message: message.into(),
        }
    }
}
