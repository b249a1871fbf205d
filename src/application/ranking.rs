//! Cross-currency ranking by normalized range.
//!
//! Both operations consume per-currency results in configured order and stop
//! at the first failure, whether it comes from loading a series or from the
//! computation itself. No partial rankings are produced.

use crate::application::statistics::{normalize, price_bounds, round_normalized};
use crate::domain::{CurrencySeries, NormalizedRange, PriceError};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use num_traits::Zero;

/// Find the currency whose price on `date` sits highest within its own
/// all-time range.
///
/// Within one currency the first strictly highest value on that date is kept.
/// Across currencies an equal value replaces the current leader, so on a tie
/// the currency configured last wins.
///
/// # Errors
///
/// - `PriceError::NoRecordForDate` as soon as a currency has no observation on `date`
/// - `PriceError::EmptySeries` if `series` yields nothing
/// - any error yielded by `series`
pub fn highest_normalized_for_date<I>(date: NaiveDate, series: I) -> Result<NormalizedRange, PriceError>
where
    I: IntoIterator<Item = Result<CurrencySeries, PriceError>>,
{
    let mut highest: Option<NormalizedRange> = None;

    for entry in series {
        let candidate = best_for_date(&entry?, date)?;
        let replace = highest
            .as_ref()
            .map_or(true, |leader| leader.normalized_range <= candidate.normalized_range);
        if replace {
            highest = Some(candidate);
        }
    }

    highest.ok_or(PriceError::EmptySeries)
}

/// Highest normalized price of one currency on `date`, measured against the
/// currency's full-history minimum and maximum.
pub fn best_for_date(series: &CurrencySeries, date: NaiveDate) -> Result<NormalizedRange, PriceError> {
    let mut on_date = series
        .observations
        .iter()
        .filter(|observation| observation.timestamp.date_naive() == date)
        .peekable();

    if on_date.peek().is_none() {
        return Err(PriceError::NoRecordForDate {
            currency: series.currency.clone(),
            date,
        });
    }

    let (min, max) = price_bounds(&series.observations)?;

    let mut best: Option<NormalizedRange> = None;
    for observation in on_date {
        let value = normalize(&observation.price, min, max)?;
        let replace = best
            .as_ref()
            .map_or(true, |current| current.normalized_range < value);
        if replace {
            best = Some(NormalizedRange {
                normalized_range: value,
                currency: observation.currency.clone(),
            });
        }
    }

    best.ok_or_else(|| PriceError::NoRecordForDate {
        currency: series.currency.clone(),
        date,
    })
}

/// Rank every currency by `(max - min) / min`, highest first.
///
/// The sort is stable: currencies with equal values keep configured order.
pub fn rank_by_normalized_range<I>(series: I) -> Result<Vec<NormalizedRange>, PriceError>
where
    I: IntoIterator<Item = Result<CurrencySeries, PriceError>>,
{
    let mut ranking = Vec::new();
    for entry in series {
        ranking.push(normalized_range(&entry?)?);
    }

    ranking.sort_by(|a, b| b.normalized_range.cmp(&a.normalized_range));
    Ok(ranking)
}

/// Spread of a currency's whole history relative to its minimum price.
///
/// The label comes from the first parsed observation.
pub fn normalized_range(series: &CurrencySeries) -> Result<NormalizedRange, PriceError> {
    let first = series.observations.first().ok_or(PriceError::EmptySeries)?;
    let (min, max) = price_bounds(&series.observations)?;

    if min.is_zero() {
        return Err(PriceError::DivisionByZero(format!(
            "minimum price of {} is zero",
            first.currency
        )));
    }

    let spread: BigDecimal = (max - min) / min.clone();
    Ok(NormalizedRange {
        normalized_range: round_normalized(&spread),
        currency: first.currency.clone(),
    })
}
