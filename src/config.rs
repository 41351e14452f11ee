//! Run parameters for the grid and cross-section reductions
//!
//! The defaults reproduce the parameters of the 2012 outburst flood study. They
//! are plain structs so tests and callers can tweak a field and call
//! `validate()` before running.

use crate::errors::{FgError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Parameters for the monthly grid statistics run
#[derive(Debug, Clone)]
pub struct GridRunConfig {
    /// Width of each interval used for interval variety and diversity
    pub interval_width: f64,
    /// Origin of interval zero
    pub start_bound: f64,
    pub months: Vec<MonthSchedule>,
}

impl GridRunConfig {
    pub fn new(interval_width: f64, start_bound: f64) -> Self {
        Self {
            interval_width,
            start_bound,
            months: vec![MonthSchedule::july(), MonthSchedule::august()],
        }
    }

    pub fn with_months(mut self, months: Vec<MonthSchedule>) -> Self {
        self.months = months;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.interval_width.is_finite() && self.interval_width > 0.0) {
            return Err(FgError::configuration(format!(
                "interval width must be positive and finite, got {}",
                self.interval_width
            )));
        }
        if !self.start_bound.is_finite() {
            return Err(FgError::configuration("start bound must be finite"));
        }
        for month in &self.months {
            if month.end_day <= month.first_day {
                return Err(FgError::configuration(format!(
                    "month {} has an empty day range {}..{}",
                    month.name, month.first_day, month.end_day
                )));
            }
        }
        Ok(())
    }

    /// `<root>/input/<Month>`
    pub fn input_dir(&self, root: &Path, month: &MonthSchedule) -> PathBuf {
        root.join("input").join(&month.name)
    }

    /// `<root>/output/<width>_<start>/<Month>`
    pub fn output_dir(&self, root: &Path, month: &MonthSchedule) -> PathBuf {
        root.join("output")
            .join(format!("{:?}_{:?}", self.interval_width, self.start_bound))
            .join(&month.name)
    }
}

impl Default for GridRunConfig {
    fn default() -> Self {
        Self::new(0.25, 0.0)
    }
}

/// The hourly grid files making up one month of output
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSchedule {
    pub name: String,
    pub first_day: u32,
    /// Exclusive
    pub end_day: u32,
    /// Label of the single midnight file closing the period
    pub final_label: String,
}

impl MonthSchedule {
    pub fn new(name: &str, first_day: u32, end_day: u32) -> Self {
        Self {
            name: name.to_string(),
            first_day,
            end_day,
            final_label: hour_label(end_day, 0),
        }
    }

    pub fn july() -> Self {
        Self::new("July", 26, 31)
    }

    pub fn august() -> Self {
        Self::new("August", 24, 30)
    }

    /// Row labels in chronological order, e.g. `26t0000`, `26t0100`, ..., `31t0000`.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = (self.first_day..self.end_day)
            .flat_map(|day| (0..24).map(move |hour| hour_label(day, hour)))
            .collect();
        labels.push(self.final_label.clone());
        labels
    }

    pub fn expected_file_count(&self) -> usize {
        (self.end_day - self.first_day) as usize * 24 + 1
    }
}

fn hour_label(day: u32, hour: u32) -> String {
    format!("{}t{:02}00", day, hour)
}

/// A physical quantity recorded along the cross sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Depth,
    Velocity,
    ShearStress,
    Froude,
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [
        Quantity::Depth,
        Quantity::Velocity,
        Quantity::ShearStress,
        Quantity::Froude,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Depth => "depth",
            Quantity::Velocity => "velocity",
            Quantity::ShearStress => "shear stress",
            Quantity::Froude => "froude",
        }
    }

    /// Ascending tier thresholds; a reading counts towards tier k when it is
    /// strictly greater than `thresholds()[k]`.
    pub fn thresholds(&self) -> [f64; 4] {
        match self {
            Quantity::Depth | Quantity::Velocity => [4.0, 6.0, 8.0, 10.0],
            Quantity::ShearStress => [200.0, 1000.0, 2500.0, 5000.0],
            Quantity::Froude => [0.8, 0.9, 1.0, 1.1],
        }
    }

    fn threshold_labels(&self) -> [&'static str; 4] {
        match self {
            Quantity::Depth | Quantity::Velocity => ["4", "6", "8", "10"],
            Quantity::ShearStress => ["200", "1000", "2500", "5000"],
            Quantity::Froude => ["0.8", "0.9", "1.0", "1.1"],
        }
    }

    /// Header fragment for the four tier columns of the summary table.
    pub fn threshold_header(&self) -> String {
        self.threshold_labels()
            .iter()
            .map(|label| format!("Number of values > {}", label))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn dir_name(&self) -> String {
        format!("{} alltimes", self.name())
    }

    pub fn file_name(&self, index: u32) -> String {
        format!("{} {}.csv", self.name(), index)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters for the cross-section run
#[derive(Debug, Clone)]
pub struct CrossSectionConfig {
    pub start: u32,
    /// Inclusive
    pub end: u32,
    pub increment: u32,
    /// Data lines dropped from the end of every input file, footer lines included
    pub trailing_rows_dropped: usize,
    pub quantities: Vec<Quantity>,
}

impl CrossSectionConfig {
    pub fn new(start: u32, end: u32, increment: u32) -> Self {
        Self {
            start,
            end,
            increment,
            trailing_rows_dropped: 4,
            quantities: Quantity::ALL.to_vec(),
        }
    }

    pub fn with_quantities(mut self, quantities: Vec<Quantity>) -> Self {
        self.quantities = quantities;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.increment == 0 {
            return Err(FgError::configuration("cross-section increment must be non-zero"));
        }
        if self.end < self.start {
            return Err(FgError::configuration(format!(
                "cross-section end {} precedes start {}",
                self.end, self.start
            )));
        }
        if self.quantities.is_empty() {
            return Err(FgError::configuration("no quantities configured"));
        }
        for quantity in &self.quantities {
            let thresholds = quantity.thresholds();
            if thresholds.windows(2).any(|w| w[0] >= w[1]) {
                return Err(FgError::configuration(format!(
                    "thresholds for {} are not strictly ascending",
                    quantity
                )));
            }
        }
        Ok(())
    }

    /// Cross-section indices `start, start + increment, ..., <= end`.
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        (self.start..=self.end).step_by(self.increment.max(1) as usize)
    }

    /// `<root>/input/MODEL OUTPUT/<quantity> alltimes`
    pub fn input_dir(&self, root: &Path, quantity: Quantity) -> PathBuf {
        root.join("input").join("MODEL OUTPUT").join(quantity.dir_name())
    }

    /// `<root>/output/MODEL OUTPUT/<quantity> alltimes`
    pub fn output_dir(&self, root: &Path, quantity: Quantity) -> PathBuf {
        root.join("output").join("MODEL OUTPUT").join(quantity.dir_name())
    }
}

impl Default for CrossSectionConfig {
    fn default() -> Self {
        Self::new(5, 1190, 5)
    }
}
