//! Domain layer - Core price entities and the price source trait.
//!
//! This module defines the domain model for the price statistics API.
//! It contains:
//! - Price observations parsed from per-currency history files
//! - Derived values (statistics, normalized ranges)
//! - The supported-currency allow-list and its configuration section
//! - The `PriceSource` trait implemented by the infrastructure layer

pub mod error;
pub use error::PriceError;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single price data point from a currency's history.
///
/// Immutable once parsed. The price is kept as an arbitrary-precision decimal
/// so that aggregation never accumulates floating point drift.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    /// UTC instant of the observation
    pub timestamp: DateTime<Utc>,
    /// Currency symbol (e.g. "BTC")
    pub currency: String,
    /// Observed price, never negative
    pub price: BigDecimal,
}

impl PriceObservation {
    pub fn new(timestamp: DateTime<Utc>, currency: impl Into<String>, price: BigDecimal) -> Self {
        Self {
            timestamp,
            currency: currency.into(),
            price,
        }
    }
}

/// The full parsed history of one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySeries {
    pub currency: String,
    pub observations: Vec<PriceObservation>,
}

/// Oldest, newest, lowest and highest price of a currency's history.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Price of the observation with the earliest timestamp
    #[serde(with = "bigdecimal::serde::json_num")]
    #[schema(value_type = f64, example = 46813.21)]
    pub oldest_price: BigDecimal,
    /// Price of the observation with the latest timestamp
    #[serde(with = "bigdecimal::serde::json_num")]
    #[schema(value_type = f64, example = 38415.79)]
    pub newest_price: BigDecimal,
    /// Lowest observed price
    #[serde(with = "bigdecimal::serde::json_num")]
    #[schema(value_type = f64, example = 33276.59)]
    pub min_price: BigDecimal,
    /// Highest observed price
    #[serde(with = "bigdecimal::serde::json_num")]
    #[schema(value_type = f64, example = 47722.66)]
    pub max_price: BigDecimal,
}

/// A currency paired with a normalized range rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRange {
    /// Normalized value, always carrying exactly two decimal places
    #[serde(with = "bigdecimal::serde::json_num")]
    #[schema(value_type = f64, example = 1.0)]
    pub normalized_range: BigDecimal,
    /// Currency symbol the value belongs to
    #[schema(example = "ETH")]
    pub currency: String,
}

/// Configuration section describing which currencies exist and where their
/// history files live.
///
/// # Examples
///
/// ```
/// use crypto_stats_gateway::domain::CurrencySettings;
///
/// let settings = CurrencySettings {
///     supported: "BTC,ETH".to_string(),
///     file_suffix: "_values.csv".to_string(),
///     directory: "data/prices".to_string(),
/// };
/// assert_eq!(settings.supported_currencies().len(), 2);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CurrencySettings {
    /// Comma-separated list of supported symbols, in ranking order
    pub supported: String,
    /// Suffix appended to a symbol to form its file name
    pub file_suffix: String,
    /// Directory holding the per-currency files
    pub directory: String,
}

impl CurrencySettings {
    pub fn supported_currencies(&self) -> SupportedCurrencies {
        SupportedCurrencies::parse(&self.supported)
    }
}

/// Ordered allow-list of currency symbols.
///
/// Membership is exact: `"BT"` is not supported just because `"BTC"` is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedCurrencies {
    symbols: Vec<String>,
}

impl SupportedCurrencies {
    /// Parse a comma-separated list, trimming blanks and dropping duplicates
    /// while keeping the first-seen order.
    pub fn parse(list: &str) -> Self {
        let mut symbols: Vec<String> = Vec::new();
        for symbol in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !symbols.iter().any(|known| known == symbol) {
                symbols.push(symbol.to_string());
            }
        }
        Self { symbols }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|known| known == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Source of per-currency price histories.
///
/// Implementations must be thread-safe (`Send + Sync`) since one instance is
/// shared by every request.
///
/// # Implementations
///
/// See `infrastructure::local_file::LocalCsvRepository` for the flat-file
/// implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Load every observation recorded for `currency`, in source order.
    ///
    /// # Errors
    ///
    /// - `PriceError::SourceMissing` if no history exists for the currency
    /// - `PriceError::SourceParseError` if the history is unreadable or malformed
    async fn observations(&self, currency: &str) -> Result<Vec<PriceObservation>, PriceError>;

    /// Whether the backing storage is reachable at all.
    fn is_available(&self) -> bool;
}
