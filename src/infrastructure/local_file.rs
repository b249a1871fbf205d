//! Local filesystem price repository.
//!
//! Reads one history file per currency from a base directory, useful when the
//! data is mounted as a volume (e.g., in Docker). Each file holds a header
//! line followed by `epochMillis,symbol,price` rows.

use crate::domain::{PriceError, PriceObservation, PriceSource};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, warn};

/// Flat-file repository resolving `<symbol><suffix>` inside a base directory.
pub struct LocalCsvRepository {
    base_path: PathBuf,
    file_suffix: String,
}

impl LocalCsvRepository {
    /// Create a new repository.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory holding the history files (e.g., "./data/prices")
    /// * `file_suffix` - Suffix appended to the symbol (e.g., "_values.csv")
    ///
    /// # Examples
    ///
    /// ```
    /// use crypto_stats_gateway::infrastructure::LocalCsvRepository;
    ///
    /// let repo = LocalCsvRepository::new("data/prices", "_values.csv");
    /// assert_eq!(repo.file_name("BTC"), "BTC_values.csv");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P, file_suffix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            file_suffix: file_suffix.into(),
        }
    }

    pub fn file_name(&self, currency: &str) -> String {
        format!("{}{}", currency, self.file_suffix)
    }

    /// Resolve the history file of `currency`, refusing anything that would
    /// leave the base directory.
    fn resolve_path(&self, file_name: &str) -> Option<PathBuf> {
        let relative = Path::new(file_name);
        let single_component = matches!(
            relative.components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
        if !single_component {
            warn!("Rejected file name outside data directory: {}", file_name);
            return None;
        }

        let joined = self.base_path.join(relative);
        if let (Ok(canonical_joined), Ok(base_canonical)) = (
            std::fs::canonicalize(&joined),
            std::fs::canonicalize(&self.base_path),
        ) {
            if !canonical_joined.starts_with(&base_canonical) {
                warn!("Path traversal attempt detected: {}", file_name);
                return None;
            }
        }
        Some(joined)
    }
}

#[async_trait]
impl PriceSource for LocalCsvRepository {
    async fn observations(&self, currency: &str) -> Result<Vec<PriceObservation>, PriceError> {
        let file_name = self.file_name(currency);
        let missing = || PriceError::SourceMissing {
            file: file_name.clone(),
        };

        let path = self.resolve_path(&file_name).ok_or_else(missing)?;
        if !path.is_file() {
            return Err(missing());
        }

        debug!("Reading price history from {}", path.display());
        let content = fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => missing(),
            _ => PriceError::SourceParseError {
                file: file_name.clone(),
                reason: e.to_string(),
            },
        })?;

        parse_price_records(currency, &file_name, &content)
    }

    fn is_available(&self) -> bool {
        self.base_path.exists() && self.base_path.is_dir()
    }
}

/// Widest decimal exponent accepted for a price, in either direction.
const MAX_PRICE_SCALE: i64 = 64;
/// Most significant digits accepted for a price.
const MAX_PRICE_DIGITS: u64 = 64;

/// Parse the body of a history file.
///
/// The first line is a header and is skipped without validation. Every other
/// line must be `epochMillis,symbol,price`; the symbol column is ignored and
/// each observation is tagged with `currency` instead. Observations keep file
/// order.
pub fn parse_price_records(
    currency: &str,
    file_name: &str,
    content: &str,
) -> Result<Vec<PriceObservation>, PriceError> {
    let malformed = |line_number: usize, reason: String| PriceError::SourceParseError {
        file: file_name.to_string(),
        reason: format!("line {}: {}", line_number, reason),
    };

    let mut observations = Vec::new();
    for (index, line) in content.lines().enumerate().skip(1) {
        let line_number = index + 1;
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 3 {
            return Err(malformed(
                line_number,
                format!("expected 3 fields, found {}", fields.len()),
            ));
        }

        let millis: i64 = fields[0]
            .trim()
            .parse()
            .map_err(|_| malformed(line_number, format!("invalid timestamp '{}'", fields[0])))?;
        let timestamp: DateTime<Utc> = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| malformed(line_number, format!("timestamp {} out of range", millis)))?;

        let price = BigDecimal::from_str(fields[2].trim())
            .map_err(|_| malformed(line_number, format!("invalid price '{}'", fields[2])))?;
        // Bound the exponent before any arithmetic touches the value
        let (_, scale) = price.as_bigint_and_exponent();
        if !(-MAX_PRICE_SCALE..=MAX_PRICE_SCALE).contains(&scale) || price.digits() > MAX_PRICE_DIGITS {
            return Err(malformed(
                line_number,
                format!("price '{}' out of range", fields[2].trim()),
            ));
        }
        if price < BigDecimal::from(0) {
            return Err(malformed(line_number, format!("negative price {}", price)));
        }

        observations.push(PriceObservation::new(timestamp, currency, price));
    }

    Ok(observations)
}
