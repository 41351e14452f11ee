//! Per-grid statistics record and the monthly grid statistics run
//!
//! Each hourly grid is reduced to one [`StatisticsRecord`]: a summary over all
//! data cells, then a distributional summary over the cells whose value is
//! neither 0 nor 1 (frequency table, moments, quartiles, mode, interval
//! diversity and dominance). The records of one month become one CSV table.

use crate::config::{GridRunConfig, MonthSchedule};
use crate::errors::{FgError, Result};
use crate::grid::{AsciiGrid, GridAccess, GridSummary};
use crate::output::{format_value, CsvTable, UNDEFINED};
use crate::statistics::{
    or_undefined, to_f64, DiversityDominanceCalculator, IntervalBinner, IntervalFrequencyTable,
    MomentCalculator, ValueFrequencyTable,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, enabled, info, warn, Level};

/// Column headers of a month table; `input` holds the hour label
pub const HEADER: &str = "input,min,max,mean,standard deviation,sum,n,\
oneCounter,zeroCounter,\
minIgnoringZeroAndOne,maxIgnoringZeroAndOne,\
rangeIgnoringZeroAndOne,meanIgnoringZeroAndOne,\
moment1,moment2,moment3,moment4,\
skewnessCyhelsky,skewness,kurtosis,variety,\
upperQuartile,median,lowerQuartile,\
mode,intervalVariety,diversity,\
intervalVarietyEvenness,numberOfIntervalsInRangeEvenness,\
maximumDiversityOverIntervalsWithValues,\
dominanceOverIntervalsWithValues,\
maximumDiversityOverIntervalsInObservedRange,\
dominanceOverIntervalsInObservedRange";

/// Number of statistics per record, the label column excluded
pub const FIELD_COUNT: usize = 32;

/// Statistics for one grid file
///
/// `min` to `sum` cover every data cell. `n` and everything after
/// `zero_count` cover only the cells valued neither 0 nor 1. `None` marks a
/// statistic that is undefined for this grid.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRecord {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub standard_deviation: Option<f64>,
    pub sum: f64,
    pub n: u64,
    pub one_count: u64,
    pub zero_count: u64,
    pub min_ignoring_zero_and_one: Option<f64>,
    pub max_ignoring_zero_and_one: Option<f64>,
    pub range_ignoring_zero_and_one: Option<f64>,
    pub mean_ignoring_zero_and_one: Option<f64>,
    pub moment1: Option<f64>,
    pub moment2: Option<f64>,
    pub moment3: Option<f64>,
    pub moment4: Option<f64>,
    pub skewness_cyhelsky: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub variety: u64,
    pub upper_quartile: Option<f64>,
    pub median: Option<f64>,
    pub lower_quartile: Option<f64>,
    pub mode: Option<f64>,
    pub interval_variety: u64,
    pub diversity: Option<f64>,
    pub interval_variety_evenness: Option<f64>,
    pub number_of_intervals_in_range_evenness: Option<f64>,
    pub maximum_diversity_over_intervals_with_values: Option<f64>,
    pub dominance_over_intervals_with_values: Option<f64>,
    pub maximum_diversity_over_intervals_in_observed_range: Option<f64>,
    pub dominance_over_intervals_in_observed_range: Option<f64>,
}

impl StatisticsRecord {
    /// A record carrying only the all-cells summary and the counters; every
    /// distributional field is undefined.
    fn without_values(summary: &GridSummary, one_count: u64, zero_count: u64) -> Self {
        Self {
            min: summary.min,
            max: summary.max,
            mean: summary.mean,
            standard_deviation: summary.standard_deviation,
            sum: summary.sum,
            n: 0,
            one_count,
            zero_count,
            min_ignoring_zero_and_one: None,
            max_ignoring_zero_and_one: None,
            range_ignoring_zero_and_one: None,
            mean_ignoring_zero_and_one: None,
            moment1: None,
            moment2: None,
            moment3: None,
            moment4: None,
            skewness_cyhelsky: None,
            skewness: None,
            kurtosis: None,
            variety: 0,
            upper_quartile: None,
            median: None,
            lower_quartile: None,
            mode: None,
            interval_variety: 0,
            diversity: None,
            interval_variety_evenness: None,
            number_of_intervals_in_range_evenness: None,
            maximum_diversity_over_intervals_with_values: None,
            dominance_over_intervals_with_values: None,
            maximum_diversity_over_intervals_in_observed_range: None,
            dominance_over_intervals_in_observed_range: None,
        }
    }

    /// The 32 statistics in header order
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            format_value(self.min),
            format_value(self.max),
            format_value(self.mean),
            format_value(self.standard_deviation),
            self.sum.to_string(),
            self.n.to_string(),
            self.one_count.to_string(),
            self.zero_count.to_string(),
            format_value(self.min_ignoring_zero_and_one),
            format_value(self.max_ignoring_zero_and_one),
            format_value(self.range_ignoring_zero_and_one),
            format_value(self.mean_ignoring_zero_and_one),
            format_value(self.moment1),
            format_value(self.moment2),
            format_value(self.moment3),
            format_value(self.moment4),
            format_value(self.skewness_cyhelsky),
            format_value(self.skewness),
            format_value(self.kurtosis),
            self.variety.to_string(),
            format_value(self.upper_quartile),
            format_value(self.median),
            format_value(self.lower_quartile),
            format_value(self.mode),
            self.interval_variety.to_string(),
            format_value(self.diversity),
            format_value(self.interval_variety_evenness),
            format_value(self.number_of_intervals_in_range_evenness),
            format_value(self.maximum_diversity_over_intervals_with_values),
            format_value(self.dominance_over_intervals_with_values),
            format_value(self.maximum_diversity_over_intervals_in_observed_range),
            format_value(self.dominance_over_intervals_in_observed_range),
        ]
    }

    /// `label,field1,...,field32`
    pub fn to_csv_row(&self, label: &str) -> String {
        let mut fields = vec![label.to_string()];
        fields.extend(self.to_fields());
        fields.join(",")
    }

    pub fn from_fields(fields: &[&str]) -> Result<Self> {
        if fields.len() != FIELD_COUNT {
            return Err(FgError::Generic(format!(
                "expected {} statistics, found {}",
                FIELD_COUNT,
                fields.len()
            )));
        }
        let mut fields = fields.iter().copied();
        let mut value = || parse_value(fields.next().unwrap_or(UNDEFINED));
        Ok(Self {
            min: value()?,
            max: value()?,
            mean: value()?,
            standard_deviation: value()?,
            sum: value()?.ok_or("sum is never undefined")?,
            n: as_count(value()?, "n")?,
            one_count: as_count(value()?, "oneCounter")?,
            zero_count: as_count(value()?, "zeroCounter")?,
            min_ignoring_zero_and_one: value()?,
            max_ignoring_zero_and_one: value()?,
            range_ignoring_zero_and_one: value()?,
            mean_ignoring_zero_and_one: value()?,
            moment1: value()?,
            moment2: value()?,
            moment3: value()?,
            moment4: value()?,
            skewness_cyhelsky: value()?,
            skewness: value()?,
            kurtosis: value()?,
            variety: as_count(value()?, "variety")?,
            upper_quartile: value()?,
            median: value()?,
            lower_quartile: value()?,
            mode: value()?,
            interval_variety: as_count(value()?, "intervalVariety")?,
            diversity: value()?,
            interval_variety_evenness: value()?,
            number_of_intervals_in_range_evenness: value()?,
            maximum_diversity_over_intervals_with_values: value()?,
            dominance_over_intervals_with_values: value()?,
            maximum_diversity_over_intervals_in_observed_range: value()?,
            dominance_over_intervals_in_observed_range: value()?,
        })
    }

    /// Parse a month table row back into its label and record.
    pub fn parse_csv_row(line: &str) -> Result<(String, Self)> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        let (label, statistics) = fields
            .split_first()
            .ok_or_else(|| FgError::Generic("empty statistics row".to_string()))?;
        Ok((label.to_string(), Self::from_fields(statistics)?))
    }
}

fn parse_value(raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw == UNDEFINED {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| FgError::Generic(format!("'{}' is not a statistic value", raw)))
}

fn as_count(value: Option<f64>, field: &str) -> Result<u64> {
    match value {
        Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
        _ => Err(FgError::Generic(format!("{} must be a non-negative integer", field))),
    }
}

/// Reduces one grid to a [`StatisticsRecord`]
#[derive(Debug, Clone)]
pub struct GridStatisticsReducer {
    binner: IntervalBinner,
}

impl GridStatisticsReducer {
    pub fn new(binner: IntervalBinner) -> Self {
        Self { binner }
    }

    pub fn from_config(config: &GridRunConfig) -> Result<Self> {
        Ok(Self::new(IntervalBinner::new(
            config.interval_width,
            config.start_bound,
        )?))
    }

    pub fn reduce<G: GridAccess + ?Sized>(&self, grid: &G) -> Result<StatisticsRecord> {
        let summary = GridSummary::compute(grid)?;
        debug!(
            "number of non-NoDataValues {}, min {:?}, max {:?}",
            summary.n, summary.min, summary.max
        );

        let mut values = ValueFrequencyTable::new();
        let mut intervals = IntervalFrequencyTable::new();
        let mut one_count = 0u64;
        let mut zero_count = 0u64;
        for row in 0..grid.n_rows() {
            for col in 0..grid.n_cols() {
                let value = grid.cell(row, col);
                if grid.is_no_data(value) {
                    continue;
                }
                if value == 1.0 {
                    one_count += 1;
                } else if value == 0.0 {
                    zero_count += 1;
                } else {
                    values.add(value)?;
                    intervals.add(self.binner.interval_id(value));
                }
            }
        }

        if values.is_empty() {
            warn!(
                "{}",
                FgError::undefined(
                    "distributional statistics",
                    "no values other than 0 and 1"
                )
            );
            return Ok(StatisticsRecord::without_values(&summary, one_count, zero_count));
        }
        info!(
            "{} values other than 1 or 0; {} ones and {} zeros ignored",
            values.n(),
            one_count,
            zero_count
        );

        self.log_tables(&values, &intervals);
        self.derive(&summary, &values, &intervals, one_count, zero_count)
    }

    fn derive(
        &self,
        summary: &GridSummary,
        values: &ValueFrequencyTable,
        intervals: &IntervalFrequencyTable,
        one_count: u64,
        zero_count: u64,
    ) -> Result<StatisticsRecord> {
        let range = values.range();
        let mean = or_undefined(values.mean())?;
        let moments = match mean {
            Some(mean) => or_undefined(MomentCalculator::compute(values, mean))?,
            None => None,
        };
        let quantiles = or_undefined(values.quantiles())?;
        let mode = or_undefined(values.mode())?;

        let intervals_in_range = self.binner.intervals_in_range(range.unwrap_or(0.0));
        let diversity = or_undefined(DiversityDominanceCalculator::compute(
            intervals,
            intervals_in_range,
        ))?;

        if let Some(modal) = intervals.modal_midpoint(&self.binner) {
            info!("modal interval mid-point {}", modal);
        }

        Ok(StatisticsRecord {
            min: summary.min,
            max: summary.max,
            mean: summary.mean,
            standard_deviation: summary.standard_deviation,
            sum: summary.sum,
            n: values.n(),
            one_count,
            zero_count,
            min_ignoring_zero_and_one: values.min(),
            max_ignoring_zero_and_one: values.max(),
            range_ignoring_zero_and_one: range,
            mean_ignoring_zero_and_one: mean.map(|m| to_f64(m, "mean")).transpose()?,
            moment1: moments
                .as_ref()
                .map(|m| to_f64(m.moment1, "moment1"))
                .transpose()?,
            moment2: moments
                .as_ref()
                .map(|m| to_f64(m.moment2, "moment2"))
                .transpose()?,
            moment3: moments
                .as_ref()
                .map(|m| to_f64(m.moment3, "moment3"))
                .transpose()?,
            moment4: moments
                .as_ref()
                .map(|m| to_f64(m.moment4, "moment4"))
                .transpose()?,
            skewness_cyhelsky: match &moments {
                Some(m) => or_undefined(m.skewness_cyhelsky())?,
                None => None,
            },
            skewness: match &moments {
                Some(m) => or_undefined(m.skewness())?,
                None => None,
            },
            kurtosis: match &moments {
                Some(m) => or_undefined(m.kurtosis())?,
                None => None,
            },
            variety: values.variety() as u64,
            upper_quartile: quantiles.map(|q| q.upper_quartile),
            median: quantiles.map(|q| q.median),
            lower_quartile: quantiles.map(|q| q.lower_quartile),
            mode,
            interval_variety: intervals.variety() as u64,
            diversity: diversity.as_ref().map(|d| d.diversity),
            interval_variety_evenness: match &diversity {
                Some(d) => or_undefined(d.interval_variety_evenness())?,
                None => None,
            },
            number_of_intervals_in_range_evenness: match &diversity {
                Some(d) => or_undefined(d.intervals_in_range_evenness())?,
                None => None,
            },
            maximum_diversity_over_intervals_with_values: diversity
                .as_ref()
                .map(|d| d.maximum_diversity_over_intervals_with_values),
            dominance_over_intervals_with_values: diversity
                .as_ref()
                .map(|d| d.dominance_over_intervals_with_values()),
            maximum_diversity_over_intervals_in_observed_range: diversity
                .as_ref()
                .map(|d| d.maximum_diversity_over_intervals_in_observed_range),
            dominance_over_intervals_in_observed_range: diversity
                .as_ref()
                .map(|d| d.dominance_over_intervals_in_observed_range()),
        })
    }

    fn log_tables(&self, values: &ValueFrequencyTable, intervals: &IntervalFrequencyTable) {
        if !enabled!(Level::DEBUG) {
            return;
        }
        for (value, count) in values.iter() {
            debug!("cell value {} number of such values {}", value, count);
        }
        for (id, count) in intervals.iter() {
            let (lower, upper) = self.binner.bounds(id);
            debug!("interval [{}, {}) number of such values {}", lower, upper, count);
        }
    }
}

/// Outcome of one month's table
#[derive(Debug, Clone)]
pub struct MonthReport {
    pub month: String,
    pub output: PathBuf,
    /// Rows written, label first, in chronological order
    pub rows: Vec<String>,
    /// Labels whose grid could not be reduced
    pub skipped: Vec<String>,
}

/// Runs the grid reducer over every hourly file of each configured month
pub struct GridStatisticsRun {
    config: GridRunConfig,
    root: PathBuf,
    reducer: GridStatisticsReducer,
}

impl GridStatisticsRun {
    pub fn new(config: GridRunConfig, root: &Path) -> Result<Self> {
        config.validate()?;
        let reducer = GridStatisticsReducer::from_config(&config)?;
        Ok(Self {
            config,
            root: root.to_path_buf(),
            reducer,
        })
    }

    pub fn run(&self) -> Result<Vec<MonthReport>> {
        self.config
            .months
            .iter()
            .map(|month| self.run_month(month))
            .collect()
    }

    pub fn run_month(&self, month: &MonthSchedule) -> Result<MonthReport> {
        let input_dir = self.config.input_dir(&self.root, month);
        let output_dir = self.config.output_dir(&self.root, month);
        let output = output_dir.join(format!("{}.csv", month.name));

        info!("expectedNumberOfFiles {}", month.expected_file_count());
        match fs::read_dir(&input_dir) {
            Ok(entries) => info!(
                "{} files in {}",
                entries.count(),
                input_dir.display()
            ),
            Err(e) => warn!("Cannot list {}: {}", input_dir.display(), e),
        }

        let mut table = CsvTable::create(&output, HEADER)?;
        let mut rows = Vec::new();
        let mut skipped = Vec::new();
        for label in month.labels() {
            let input = input_dir.join(format!("{}.txt", label));
            info!("Processing {}", input.display());
            match self.reduce_file(&input) {
                Ok(record) => {
                    let row = record.to_csv_row(&label);
                    table.write_line(&row)?;
                    rows.push(row);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping {}: {}", label, e);
                    skipped.push(label);
                }
                Err(e) => return Err(e),
            }
        }
        table.finish()?;

        Ok(MonthReport {
            month: month.name.clone(),
            output,
            rows,
            skipped,
        })
    }

    pub fn reduce_file(&self, path: &Path) -> Result<StatisticsRecord> {
        let grid = AsciiGrid::open(path)?;
        self.reducer.reduce(&grid)
    }
}
