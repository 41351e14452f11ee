//! Cross-section time series input
//!
//! Each cross-section file is a CSV with a one-line header. The first column
//! is a `"<date> <HH:MM>"` timestamp, the remaining columns are one reading per
//! position across the section. Readings of `0` and `-999` mean no reading, as
//! do empty or unparseable cells.

use crate::errors::{FgError, Result};
use chrono::{NaiveTime, Timelike};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sentinel written by the flood model where a position was not wetted
pub const NO_READING: f64 = -999.0;

/// A `"<date> <HH:MM>"` timestamp as it appears in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    date: String,
    clock: String,
    time: NaiveTime,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let mut parts = raw.split_whitespace();
        let (date, clock) = match (parts.next(), parts.next()) {
            (Some(date), Some(clock)) => (date, clock),
            _ => {
                return Err(FgError::Generic(format!(
                    "timestamp '{}' is not '<date> <HH:MM>'",
                    raw
                )))
            }
        };
        let time = NaiveTime::parse_from_str(clock, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M:%S"))
            .map_err(|e| FgError::Generic(format!("timestamp '{}': {}", raw, e)))?;
        Ok(Self {
            raw: raw.to_string(),
            date: date.to_string(),
            clock: clock.to_string(),
            time,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// The time-of-day part exactly as written
    pub fn clock(&self) -> &str {
        &self.clock
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    fn minute_of_day(&self) -> i64 {
        i64::from(self.time.hour()) * 60 + i64::from(self.time.minute())
    }

    pub fn same_date(&self, other: &Timestamp) -> bool {
        self.date.eq_ignore_ascii_case(&other.date)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Minutes from `inundation` to `max`, both on the same date.
///
/// Seconds are ignored. Timestamps on different dates are a
/// [`FgError::TimeArithmeticMismatch`].
pub fn time_to_max(inundation: &Timestamp, max: &Timestamp) -> Result<i64> {
    if !inundation.same_date(max) {
        return Err(FgError::TimeArithmeticMismatch {
            inundation: inundation.raw.clone(),
            max: max.raw.clone(),
        });
    }
    Ok(max.minute_of_day() - inundation.minute_of_day())
}

/// True for a value that counts as a reading.
pub fn is_reading(value: f64) -> bool {
    value != 0.0 && value != NO_READING && value.is_finite()
}

/// One timestamped row of readings; `None` marks no reading
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    pub timestamp: Timestamp,
    pub values: Vec<Option<f64>>,
}

impl TimeSeriesRow {
    pub fn readings(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}

/// One data line of a cross-section file
#[derive(Debug, Clone, PartialEq)]
enum SeriesLine {
    Row(TimeSeriesRow),
    /// A line whose timestamp did not parse, such as a `Maximum,...` footer
    Malformed { line: usize, message: String },
}

/// All data lines of one cross-section file, in file order.
///
/// Lines with an unparseable timestamp are held in place until
/// [`drop_trailing_rows`](Self::drop_trailing_rows) has run, so footer lines
/// count toward the trim. [`rows`](Self::rows) yields only timestamped rows.
#[derive(Debug, Clone, Default)]
pub struct CrossSectionSeries {
    pub path: PathBuf,
    lines: Vec<SeriesLine>,
}

impl CrossSectionSeries {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FgError::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text, path))
    }

    /// Parse CSV text, skipping the header line and blank lines. Bad cells
    /// become `None`.
    pub fn parse(text: &str, path: &Path) -> Self {
        let mut lines = Vec::new();
        for (index, line) in text.lines().enumerate().skip(1) {
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(',');
            let raw_time = fields.next().unwrap_or_default();
            match Timestamp::parse(raw_time) {
                Ok(timestamp) => {
                    let values = fields
                        .map(|field| parse_cell(field, path, line_number))
                        .collect();
                    lines.push(SeriesLine::Row(TimeSeriesRow { timestamp, values }));
                }
                Err(e) => {
                    debug!("{}:{}: {}", path.display(), line_number, e);
                    lines.push(SeriesLine::Malformed {
                        line: line_number,
                        message: e.to_string(),
                    });
                }
            }
        }
        debug!("Read {} data lines from {}", lines.len(), path.display());
        Self {
            path: path.to_path_buf(),
            lines,
        }
    }

    /// Drop the last `count` data lines (all of them if there are fewer),
    /// whether or not their timestamps parsed.
    pub fn drop_trailing_rows(&mut self, count: usize) {
        let keep = self.lines.len().saturating_sub(count);
        self.lines.truncate(keep);
    }

    /// Warn about each remaining line with a bad timestamp and return how
    /// many there were. Those lines are never yielded by [`rows`](Self::rows).
    pub fn report_malformed(&self) -> usize {
        let mut count = 0;
        for entry in &self.lines {
            if let SeriesLine::Malformed { line, message } = entry {
                warn!(
                    "{}",
                    FgError::MalformedRecord {
                        path: self.path.clone(),
                        line: *line,
                        message: message.clone(),
                    }
                );
                count += 1;
            }
        }
        count
    }

    /// Timestamped rows, in file order
    pub fn rows(&self) -> impl Iterator<Item = &TimeSeriesRow> + '_ {
        self.lines.iter().filter_map(|entry| match entry {
            SeriesLine::Row(row) => Some(row),
            SeriesLine::Malformed { .. } => None,
        })
    }

    /// Width of the widest row
    pub fn n_cols(&self) -> usize {
        self.rows().map(|row| row.values.len()).max().unwrap_or(0)
    }

    pub fn n_rows(&self) -> usize {
        self.rows().count()
    }
}

fn parse_cell(field: &str, path: &Path, line: usize) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        debug!("value is nodata at {}:{}", path.display(), line);
        return None;
    }
    match field.parse::<f64>() {
        Ok(value) if is_reading(value) => Some(value),
        Ok(_) => None,
        Err(_) => {
            warn!(
                "{}",
                FgError::MalformedRecord {
                    path: path.to_path_buf(),
                    line,
                    message: format!("cell '{}' treated as no reading", field),
                }
            );
            None
        }
    }
}
