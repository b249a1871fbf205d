//! Input validation performed before any history file is touched.

use crate::domain::{PriceError, SupportedCurrencies};
use chrono::NaiveDate;
use tracing::info;

/// Reject symbols that are not exact members of the configured allow-list.
pub fn validate_currency(currency: &str, supported: &SupportedCurrencies) -> Result<(), PriceError> {
    if supported.contains(currency) {
        Ok(())
    } else {
        info!("Currency {} not supported", currency);
        Err(PriceError::UnsupportedCurrency {
            currency: currency.to_string(),
        })
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// Single-digit months or days ("2022-1-3") and impossible dates
/// ("2022-21-01", "2022-02-30") are rejected.
pub fn validate_date(date: &str) -> Result<NaiveDate, PriceError> {
    let invalid = || PriceError::InvalidDate {
        date: date.to_string(),
    };

    let bytes = date.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())
}
