//! Frequency-table statistics over a stream of values
//!
//! The helpers here are shared by the value table, the moment calculator and
//! the grid summary: decimal conversion with overflow reporting, half-up
//! rounding, and the mapping of undefined statistics to `None`.
//!
//! - [`frequency`]: value → count table, quartiles, median, mode
//! - [`moments`]: central moments, skewness, kurtosis
//! - [`intervals`]: fixed-width interval binning
//! - [`diversity`]: Shannon diversity, evenness and dominance

pub mod diversity;
pub mod frequency;
pub mod intervals;
pub mod moments;

pub use diversity::{DiversityDominance, DiversityDominanceCalculator};
pub use frequency::{Quantiles, ValueFrequencyTable};
pub use intervals::{IntervalBinner, IntervalFrequencyTable};
pub use moments::{Moments, MomentCalculator};

use crate::errors::{FgError, Result};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use tracing::warn;

/// Decimal places used when dividing accumulated decimal sums
pub const DECIMAL_PLACES: u32 = 10;

pub(crate) fn to_decimal(value: f64, statistic: &'static str) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| {
        FgError::undefined(statistic, format!("{} is outside the decimal range", value))
    })
}

pub(crate) fn to_f64(value: Decimal, statistic: &'static str) -> Result<f64> {
    value.to_f64().ok_or_else(|| {
        FgError::undefined(statistic, format!("{} has no f64 representation", value))
    })
}

/// Turn a `checked_*` decimal result into an error on overflow.
pub(crate) fn checked(value: Option<Decimal>, statistic: &'static str) -> Result<Decimal> {
    value.ok_or_else(|| FgError::undefined(statistic, "decimal overflow"))
}

pub(crate) fn round_half_up(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Map an undefined statistic to `None`, logging why. Other errors pass through.
pub fn or_undefined<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ FgError::UndefinedStatistic { .. }) => {
            warn!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Reject NaN and infinite ratios so they never reach an output table.
pub(crate) fn finite(value: f64, statistic: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FgError::undefined(statistic, format!("evaluates to {}", value)))
    }
}
