//! Shannon diversity, evenness and dominance over occupied intervals
//!
//! Dominance compares the observed diversity with a maximally even reference
//! distribution of the same `n` observations over the same number of bins.
//! The reference is built by handing each successive bin
//! `remaining / bins_remaining` observations (integer division), so when `n`
//! is not divisible by the bin count the earlier bins receive the smaller
//! shares. Bins that receive no observation contribute nothing (`0 ln 0 = 0`).

use super::{finite, IntervalFrequencyTable};
use crate::errors::{FgError, Result};

/// Diversity and dominance statistics for one interval table
#[derive(Debug, Clone, PartialEq)]
pub struct DiversityDominance {
    pub n: u64,
    /// `-Σ p_i ln p_i` over occupied intervals
    pub diversity: f64,
    /// `Σ p_i²` over occupied intervals
    pub sum_proportion_squared: f64,
    pub interval_variety: u64,
    pub intervals_in_range: u64,
    pub maximum_diversity_over_intervals_with_values: f64,
    pub maximum_diversity_over_intervals_in_observed_range: f64,
}

pub struct DiversityDominanceCalculator;

impl DiversityDominanceCalculator {
    pub fn compute(
        table: &IntervalFrequencyTable,
        intervals_in_range: u64,
    ) -> Result<DiversityDominance> {
        let n = table.n();
        if n == 0 {
            return Err(FgError::undefined("diversity", "no values"));
        }

        let mut diversity = 0.0;
        let mut sum_proportion_squared = 0.0;
        for (_, count) in table.iter() {
            let proportion = count as f64 / n as f64;
            sum_proportion_squared += proportion * proportion;
            diversity -= proportion * proportion.ln();
        }

        let interval_variety = table.variety() as u64;
        Ok(DiversityDominance {
            n,
            diversity,
            sum_proportion_squared,
            interval_variety,
            intervals_in_range,
            maximum_diversity_over_intervals_with_values: maximum_diversity(n, interval_variety),
            maximum_diversity_over_intervals_in_observed_range: maximum_diversity(
                n,
                intervals_in_range,
            ),
        })
    }
}

/// Shannon entropy of `n` observations spread as evenly as integer shares
/// allow over `bins` bins.
pub fn maximum_diversity(n: u64, bins: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let mut remaining = n;
    let mut bins_remaining = bins;
    let mut diversity = 0.0;
    while bins_remaining > 0 {
        let share = remaining / bins_remaining;
        remaining -= share;
        bins_remaining -= 1;
        if share > 0 {
            let proportion = share as f64 / n as f64;
            diversity -= proportion * proportion.ln();
        }
    }
    diversity
}

impl DiversityDominance {
    pub fn dominance_over_intervals_with_values(&self) -> f64 {
        self.maximum_diversity_over_intervals_with_values + self.diversity
    }

    pub fn dominance_over_intervals_in_observed_range(&self) -> f64 {
        self.maximum_diversity_over_intervals_in_observed_range + self.diversity
    }

    /// `-100 log10(Σ p²) / log10(interval variety)`
    pub fn interval_variety_evenness(&self) -> Result<f64> {
        self.evenness("intervalVarietyEvenness", self.interval_variety)
    }

    /// `-100 log10(Σ p²) / log10(intervals in observed range)`
    pub fn intervals_in_range_evenness(&self) -> Result<f64> {
        self.evenness("numberOfIntervalsInRangeEvenness", self.intervals_in_range)
    }

    fn evenness(&self, statistic: &'static str, bins: u64) -> Result<f64> {
        if bins <= 1 {
            return Err(FgError::undefined(
                statistic,
                format!("log10 of {} interval(s) is not a usable denominator", bins),
            ));
        }
        let evenness = (-100.0 * self.sum_proportion_squared.log10()) / (bins as f64).log10();
        finite(evenness, statistic)
    }
}
