//! Fixed-width interval binning
//!
//! `id = trunc((value - start) / width)`. The quotient is truncated toward
//! zero, not floored, so for values just below `start` (within one width) the
//! id is still 0 and the first negative id is only reached at `start - width`.

use crate::errors::{FgError, Result};
use std::collections::BTreeMap;

/// Maps values to interval ids relative to an origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalBinner {
    width: f64,
    start: f64,
}

impl IntervalBinner {
    pub fn new(width: f64, start: f64) -> Result<Self> {
        if !(width.is_finite() && width > 0.0) {
            return Err(FgError::configuration(format!(
                "interval width must be positive and finite, got {}",
                width
            )));
        }
        if !start.is_finite() {
            return Err(FgError::configuration("interval start bound must be finite"));
        }
        Ok(Self { width, start })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn interval_id(&self, value: f64) -> i64 {
        ((value - self.start) / self.width) as i64
    }

    /// Lower and upper bound of an interval
    pub fn bounds(&self, id: i64) -> (f64, f64) {
        let lower = id as f64 * self.width + self.start;
        (lower, lower + self.width)
    }

    pub fn midpoint(&self, id: i64) -> f64 {
        id as f64 * self.width + self.start + self.width / 2.0
    }

    /// Number of intervals that could exist across an observed range:
    /// `ceil(range / width)`.
    pub fn intervals_in_range(&self, range: f64) -> u64 {
        if range <= 0.0 {
            return 0;
        }
        (range / self.width).ceil() as u64
    }
}

/// Occurrence counts per interval id, ascending by id
///
/// Invariant: the counts always sum to [`n`](Self::n).
#[derive(Debug, Clone, Default)]
pub struct IntervalFrequencyTable {
    counts: BTreeMap<i64, u64>,
    n: u64,
}

impl IntervalFrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: i64) {
        *self.counts.entry(id).or_insert(0) += 1;
        self.n += 1;
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    /// Number of occupied intervals
    pub fn variety(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, id: i64) -> u64 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// `(id, count)` pairs in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.counts.iter().map(|(&id, &count)| (id, count))
    }

    /// Mean of the mid-points of every interval holding the largest count.
    pub fn modal_midpoint(&self, binner: &IntervalBinner) -> Option<f64> {
        let mode_count = self.counts.values().copied().max()?;
        let modal: Vec<f64> = self
            .iter()
            .filter(|&(_, count)| count == mode_count)
            .map(|(id, _)| binner.midpoint(id))
            .collect();
        Some(modal.iter().sum::<f64>() / modal.len() as f64)
    }
}
