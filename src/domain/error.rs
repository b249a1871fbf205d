use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by the price pipeline.
///
/// Every variant is terminal for the current request: nothing in the core
/// retries or recovers, the HTTP layer decides how each one is rendered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    #[error("Currency not supported")]
    UnsupportedCurrency { currency: String },

    #[error("Date provided is invalid and must be in format YYYY-MM-dd = {date}")]
    InvalidDate { date: String },

    #[error("File missing = {file}")]
    SourceMissing { file: String },

    #[error("Error occurred while reading csv file {file}: {reason}")]
    SourceParseError { file: String, reason: String },

    #[error("No record found in csv for {currency} on date {date}")]
    NoRecordForDate { currency: String, date: NaiveDate },

    #[error("No price records available to compute statistics")]
    EmptySeries,

    #[error("Normalized range is undefined: {0}")]
    DivisionByZero(String),
}

impl PriceError {
    /// Short machine-readable label, used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PriceError::UnsupportedCurrency { .. } => "unsupported_currency",
            PriceError::InvalidDate { .. } => "invalid_date",
            PriceError::SourceMissing { .. } => "source_missing",
            PriceError::SourceParseError { .. } => "source_parse_error",
            PriceError::NoRecordForDate { .. } => "no_record_for_date",
            PriceError::EmptySeries => "empty_series",
            PriceError::DivisionByZero(_) => "division_by_zero",
        }
    }
}
