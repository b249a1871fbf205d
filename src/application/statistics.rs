//! Aggregate statistics over a single currency's observations.

use crate::domain::{PriceError, PriceObservation, Statistics};
use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::Zero;

/// Number of decimal places every normalized value carries.
pub const NORMALIZED_SCALE: i64 = 2;

/// Compute oldest, newest, minimum and maximum price.
///
/// Ties on price or timestamp keep the observation seen first, so the result
/// does not depend on anything but the input order.
///
/// # Errors
///
/// Returns `PriceError::EmptySeries` if `observations` is empty.
pub fn compute_statistics(observations: &[PriceObservation]) -> Result<Statistics, PriceError> {
    let (first, rest) = observations.split_first().ok_or(PriceError::EmptySeries)?;

    let mut oldest = first;
    let mut newest = first;
    let mut min = first;
    let mut max = first;

    for observation in rest {
        if observation.price < min.price {
            min = observation;
        }
        if observation.price > max.price {
            max = observation;
        }
        if observation.timestamp < oldest.timestamp {
            oldest = observation;
        }
        if observation.timestamp > newest.timestamp {
            newest = observation;
        }
    }

    Ok(Statistics {
        oldest_price: oldest.price.clone(),
        newest_price: newest.price.clone(),
        min_price: min.price.clone(),
        max_price: max.price.clone(),
    })
}

/// Lowest and highest price of the series.
pub fn price_bounds(
    observations: &[PriceObservation],
) -> Result<(&BigDecimal, &BigDecimal), PriceError> {
    let (first, rest) = observations.split_first().ok_or(PriceError::EmptySeries)?;

    let mut min = &first.price;
    let mut max = &first.price;
    for observation in rest {
        if observation.price < *min {
            min = &observation.price;
        }
        if observation.price > *max {
            max = &observation.price;
        }
    }
    Ok((min, max))
}

/// Position of `value` inside `[min, max]`: `(value - min) / (max - min)`,
/// rounded half-up to two decimals.
///
/// # Errors
///
/// Returns `PriceError::DivisionByZero` when `min == max`.
pub fn normalize(
    value: &BigDecimal,
    min: &BigDecimal,
    max: &BigDecimal,
) -> Result<BigDecimal, PriceError> {
    let spread = max - min;
    if spread.is_zero() {
        return Err(PriceError::DivisionByZero(format!(
            "price range is flat at {}",
            min
        )));
    }
    Ok(round_normalized(&((value - min) / spread)))
}

pub(crate) fn round_normalized(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(NORMALIZED_SCALE, RoundingMode::HalfUp)
}
