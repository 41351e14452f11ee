//! Ascending value → count table with cumulative-count quantiles
//!
//! Quartiles and the median are read off a single ascending traversal: each is
//! the first value at which the running count exceeds `floor(n/4)`,
//! `floor(n/2)` or `floor(3n/4)`. No interpolation is applied.

use super::{checked, round_half_up, to_decimal, to_f64, DECIMAL_PLACES};
use crate::errors::{FgError, Result};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Total-order wrapper so finite doubles can key a `BTreeMap`
#[derive(Debug, Clone, Copy)]
struct OrderedValue(f64);

impl PartialEq for OrderedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedValue {}

impl PartialOrd for OrderedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Lower quartile, median and upper quartile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantiles {
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
}

/// Occurrence counts of distinct values, kept in ascending value order
///
/// Invariant: the counts always sum to [`n`](Self::n).
#[derive(Debug, Clone, Default)]
pub struct ValueFrequencyTable {
    counts: BTreeMap<OrderedValue, u64>,
    n: u64,
    sum: Decimal,
    min: Option<f64>,
    max: Option<f64>,
}

impl ValueFrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one observation. Non-finite values are rejected.
    pub fn add(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(FgError::Generic(format!(
                "cannot tabulate non-finite value {}",
                value
            )));
        }
        self.sum = checked(self.sum.checked_add(to_decimal(value, "sum")?), "sum")?;
        *self.counts.entry(OrderedValue(value)).or_insert(0) += 1;
        self.n += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        Ok(())
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Number of distinct values
    pub fn variety(&self) -> usize {
        self.counts.len()
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn range(&self) -> Option<f64> {
        Some(self.max? - self.min?)
    }

    /// Exact decimal sum of all observations
    pub fn sum(&self) -> Decimal {
        self.sum
    }

    pub fn count(&self, value: f64) -> u64 {
        self.counts.get(&OrderedValue(value)).copied().unwrap_or(0)
    }

    /// `(value, count)` pairs in ascending value order
    pub fn iter(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.counts.iter().map(|(value, &count)| (value.0, count))
    }

    /// Decimal mean rounded half-up to ten places.
    pub fn mean(&self) -> Result<Decimal> {
        if self.n == 0 {
            return Err(FgError::undefined("mean", "no values"));
        }
        let mean = checked(self.sum.checked_div(Decimal::from(self.n)), "mean")?;
        Ok(round_half_up(mean, DECIMAL_PLACES))
    }

    pub fn quantiles(&self) -> Result<Quantiles> {
        if self.n == 0 {
            return Err(FgError::undefined("quantiles", "no values"));
        }
        let lower_index = self.n / 4;
        let median_index = self.n / 2;
        let upper_index = (self.n * 3) / 4;

        let mut lower_quartile = None;
        let mut median = None;
        let mut upper_quartile = None;
        let mut sum_count = 0u64;
        for (value, count) in self.iter() {
            sum_count += count;
            if lower_quartile.is_none() && sum_count > lower_index {
                lower_quartile = Some(value);
            }
            if median.is_none() && sum_count > median_index {
                median = Some(value);
            }
            if upper_quartile.is_none() && sum_count > upper_index {
                upper_quartile = Some(value);
                break;
            }
        }

        match (lower_quartile, median, upper_quartile) {
            (Some(lower_quartile), Some(median), Some(upper_quartile)) => Ok(Quantiles {
                lower_quartile,
                median,
                upper_quartile,
            }),
            _ => Err(FgError::undefined(
                "quantiles",
                "cumulative count never passed the quartile positions",
            )),
        }
    }

    /// Largest count held by any value
    pub fn mode_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Mean of every value whose count equals the largest count.
    pub fn mode(&self) -> Result<f64> {
        let mode_count = self.mode_count();
        if mode_count == 0 {
            return Err(FgError::undefined("mode", "no values"));
        }
        let mut modal_sum = Decimal::ZERO;
        let mut modal_values = 0u64;
        for (value, _) in self.iter().filter(|&(_, count)| count == mode_count) {
            modal_sum = checked(modal_sum.checked_add(to_decimal(value, "mode")?), "mode")?;
            modal_values += 1;
        }
        let mode = checked(modal_sum.checked_div(Decimal::from(modal_values)), "mode")?;
        to_f64(mode, "mode")
    }
}
