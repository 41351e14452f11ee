//! Row and column generalisation of cross-section time series
//!
//! For every cross-section index and quantity the series is reduced in two
//! passes. The row pass produces per-row n/sum/mean/max, the grand totals and
//! the nested threshold tier counts. The column pass tracks, per position,
//! when it was first wetted and when it peaked, and finds the first
//! occurrence of the section-wide maximum.

use crate::config::{CrossSectionConfig, Quantity};
use crate::errors::{FgError, Result};
use crate::output::{format_optional, format_value, CsvTable, UNDEFINED};
use crate::statistics::or_undefined;
use crate::timeseries::{time_to_max, CrossSectionSeries, Timestamp};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ROW_HEADER: &str = "n,sum,mean,max";

pub const COLUMN_HEADER: &str = "Cross Section Column,Inundation Time,Time at Max,Time To Max,Max";

/// Leading columns of a per-quantity summary table; the four threshold
/// columns of the quantity follow.
pub const SUMMARY_HEADER: &str = "Cross Section Number,Total N,Total Sum,Mean,Max,\
MaxCount,Inundation Time Max Column,Max Time,Time to Max,";

/// State of one position across the section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRecord {
    pub max_value: Option<f64>,
    /// First time the position had a reading
    pub inundation: Option<Timestamp>,
    /// Earliest time the position reached `max_value`
    pub max_time: Option<Timestamp>,
}

impl ColumnRecord {
    pub fn is_inundated(&self) -> bool {
        self.inundation.is_some()
    }

    fn observe(&mut self, value: f64, timestamp: &Timestamp) {
        match self.max_value {
            None => {
                self.inundation = Some(timestamp.clone());
                self.max_time = Some(timestamp.clone());
                self.max_value = Some(value);
            }
            Some(max) if value > max => {
                self.max_time = Some(timestamp.clone());
                self.max_value = Some(value);
            }
            Some(_) => {}
        }
    }

    /// Minutes from inundation to peak, if the position was ever wetted
    pub fn time_to_max(&self) -> Option<Result<i64>> {
        match (&self.inundation, &self.max_time) {
            (Some(inundation), Some(max)) => Some(time_to_max(inundation, max)),
            _ => None,
        }
    }
}

/// Generalisation of one row that had at least one reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSummary {
    pub n: u64,
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
}

/// Reduction of one cross-section file for one quantity
#[derive(Debug, Clone)]
pub struct CrossSectionAccumulator {
    pub index: u32,
    pub quantity: Quantity,
    pub total_n: u64,
    pub total_sum: f64,
    pub total_max: Option<f64>,
    /// Number of readings equal to `total_max`
    pub max_count: u64,
    /// Rows whose readings reached each tier; tier k implies every lower tier
    pub tier_counts: [u64; 4],
    /// Inundation time of the column holding the first section-wide maximum
    pub inundation_time_max_column: Option<Timestamp>,
    /// Time of the first section-wide maximum
    pub max_time: Option<Timestamp>,
    pub columns: Vec<ColumnRecord>,
    pub rows: Vec<RowSummary>,
}

impl CrossSectionAccumulator {
    fn new(index: u32, quantity: Quantity, n_cols: usize) -> Self {
        Self {
            index,
            quantity,
            total_n: 0,
            total_sum: 0.0,
            total_max: None,
            max_count: 0,
            tier_counts: [0; 4],
            inundation_time_max_column: None,
            max_time: None,
            columns: vec![ColumnRecord::default(); n_cols],
            rows: Vec::new(),
        }
    }

    pub fn reduce(index: u32, quantity: Quantity, series: &CrossSectionSeries) -> Self {
        let mut accumulator = Self::new(index, quantity, series.n_cols());
        accumulator.row_pass(series);
        accumulator.column_pass(series);
        accumulator
    }

    fn row_pass(&mut self, series: &CrossSectionSeries) {
        let thresholds = self.quantity.thresholds();
        for row in series.rows() {
            let mut n = 0u64;
            let mut sum = 0.0;
            let mut max: Option<f64> = None;
            for value in row.readings() {
                n += 1;
                sum += value;
                max = Some(max.map_or(value, |m| m.max(value)));
                self.total_n += 1;
                self.total_sum += value;
                self.total_max = Some(self.total_max.map_or(value, |m| m.max(value)));
            }

            let Some(max) = max else {
                continue;
            };
            let tier = tier_of(max, &thresholds);
            for count in self.tier_counts.iter_mut().take(tier) {
                *count += 1;
            }

            let summary = RowSummary {
                n,
                sum,
                mean: sum / n as f64,
                max,
            };
            debug!(
                "{} n {} sum {} mean {} max {}",
                row.timestamp, summary.n, summary.sum, summary.mean, summary.max
            );
            self.rows.push(summary);
        }
    }

    fn column_pass(&mut self, series: &CrossSectionSeries) {
        for row in series.rows() {
            for (column, value) in row.values.iter().enumerate() {
                let Some(value) = *value else {
                    continue;
                };
                let record = &mut self.columns[column];
                record.observe(value, &row.timestamp);
                if Some(value) == self.total_max {
                    if self.max_count == 0 {
                        self.max_time = Some(row.timestamp.clone());
                        self.inundation_time_max_column = record.inundation.clone();
                    }
                    self.max_count += 1;
                }
            }
        }
    }

    /// Grand mean over every reading in the section
    pub fn mean(&self) -> Result<f64> {
        if self.total_n == 0 {
            return Err(FgError::undefined("cross-section mean", "no readings"));
        }
        Ok(self.total_sum / self.total_n as f64)
    }

    /// Minutes from the max column's inundation to the section-wide maximum
    pub fn time_to_max(&self) -> Option<Result<i64>> {
        match (&self.inundation_time_max_column, &self.max_time) {
            (Some(inundation), Some(max)) => Some(time_to_max(inundation, max)),
            _ => None,
        }
    }

    pub fn write_rows(&self, path: &Path) -> Result<()> {
        let mut table = CsvTable::create(path, ROW_HEADER)?;
        for row in &self.rows {
            table.write_row(&[
                row.n.to_string(),
                row.sum.to_string(),
                row.mean.to_string(),
                row.max.to_string(),
            ])?;
        }
        table.finish()
    }

    pub fn write_columns(&self, path: &Path) -> Result<()> {
        let mut table = CsvTable::create(path, COLUMN_HEADER)?;
        for (column, record) in self.columns.iter().enumerate() {
            table.write_row(&[
                column.to_string(),
                clock_field(record.inundation.as_ref()),
                clock_field(record.max_time.as_ref()),
                minutes_field(record.time_to_max()),
                format_optional(record.max_value),
            ])?;
        }
        table.finish()
    }

    /// One summary table row: section number, totals, max timing, tier counts
    pub fn summary_fields(&self) -> Result<Vec<String>> {
        let mean = or_undefined(self.mean())?;
        let mut fields = vec![
            self.index.to_string(),
            self.total_n.to_string(),
            self.total_sum.to_string(),
            format_value(mean),
            format_optional(self.total_max),
            self.max_count.to_string(),
            clock_field(self.inundation_time_max_column.as_ref()),
            clock_field(self.max_time.as_ref()),
            minutes_field(self.time_to_max()),
        ];
        fields.extend(self.tier_counts.iter().map(|count| count.to_string()));
        Ok(fields)
    }
}

/// Number of leading thresholds strictly exceeded by `value`.
pub fn tier_of(value: f64, thresholds: &[f64]) -> usize {
    thresholds.iter().take_while(|&&t| value > t).count()
}

fn clock_field(timestamp: Option<&Timestamp>) -> String {
    timestamp.map(|t| t.clock().to_string()).unwrap_or_default()
}

fn minutes_field(minutes: Option<Result<i64>>) -> String {
    match minutes {
        None => String::new(),
        Some(Ok(minutes)) => minutes.to_string(),
        Some(Err(e)) => {
            warn!("{}", e);
            UNDEFINED.to_string()
        }
    }
}

/// Outcome of a cross-section run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Summary rows written, tagged with their quantity
    pub rows: Vec<(Quantity, String)>,
    /// Index and quantity pairs that could not be reduced
    pub skipped: Vec<(Quantity, u32)>,
    pub summaries: Vec<PathBuf>,
}

struct QuantityOutput {
    quantity: Quantity,
    input_dir: PathBuf,
    row_dir: PathBuf,
    column_dir: PathBuf,
    summary: CsvTable,
}

/// Runs the cross-section reduction over every configured index and quantity
pub struct CrossSectionRun {
    config: CrossSectionConfig,
    root: PathBuf,
}

impl CrossSectionRun {
    pub fn new(config: CrossSectionConfig, root: &Path) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            root: root.to_path_buf(),
        })
    }

    pub fn run(&self) -> Result<RunReport> {
        let mut outputs = self
            .config
            .quantities
            .iter()
            .map(|&quantity| self.prepare(quantity))
            .collect::<Result<Vec<_>>>()?;

        let mut report = RunReport {
            summaries: outputs.iter().map(|o| o.summary.path().to_path_buf()).collect(),
            ..RunReport::default()
        };

        let mut processed = 0usize;
        for index in self.config.indices() {
            processed += 1;
            for output in outputs.iter_mut() {
                match self.process(output, index) {
                    Ok(fields) => {
                        output.summary.write_row(&fields)?;
                        report.rows.push((output.quantity, fields.join(",")));
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!("Skipping {} {}: {}", output.quantity, index, e);
                        report.skipped.push((output.quantity, index));
                    }
                    Err(e) => return Err(e),
                }
                check_file_count(&output.input_dir, output.quantity, processed);
            }
        }

        for output in outputs {
            output.summary.finish()?;
        }
        Ok(report)
    }

    fn prepare(&self, quantity: Quantity) -> Result<QuantityOutput> {
        let output_dir = self.config.output_dir(&self.root, quantity);
        let row_dir = output_dir.join("rowGeneralisation");
        let column_dir = output_dir.join("colGeneralisation");
        fs::create_dir_all(&row_dir)?;
        fs::create_dir_all(&column_dir)?;
        let summary_path = output_dir
            .join("rowAndColGeneralisation")
            .join(format!("{}.csv", quantity.name()));
        let header = format!("{}{}", SUMMARY_HEADER, quantity.threshold_header());
        Ok(QuantityOutput {
            quantity,
            input_dir: self.config.input_dir(&self.root, quantity),
            row_dir,
            column_dir,
            summary: CsvTable::create(&summary_path, &header)?,
        })
    }

    fn process(&self, output: &QuantityOutput, index: u32) -> Result<Vec<String>> {
        let file_name = output.quantity.file_name(index);
        let input = output.input_dir.join(&file_name);
        info!("File {}", input.display());

        let mut series = CrossSectionSeries::open(&input)?;
        series.drop_trailing_rows(self.config.trailing_rows_dropped);
        series.report_malformed();

        let accumulator = CrossSectionAccumulator::reduce(index, output.quantity, &series);
        accumulator.write_rows(&output.row_dir.join(&file_name))?;
        accumulator.write_columns(&output.column_dir.join(&file_name))?;
        accumulator.summary_fields()
    }
}

/// Warn when the number of `<quantity> *.csv` inputs differs from the number
/// of indices processed so far.
fn check_file_count(input_dir: &Path, quantity: Quantity, expected: usize) {
    let prefix = format!("{} ", quantity.name());
    let entries = match fs::read_dir(input_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list {}: {}", input_dir.display(), e);
            return;
        }
    };
    let found = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&prefix) && name.ends_with(".csv")
        })
        .count();
    if found != expected {
        warn!(
            "{} file count check: {} files found != {} expected",
            quantity, found, expected
        );
    }
}
