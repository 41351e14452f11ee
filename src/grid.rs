//! ESRI ASCII grid loading and cell access
//!
//! Grids are read eagerly into an `ndarray::Array2<f64>`. The reducers only see
//! the [`GridAccess`] trait, so any other raster store can feed them.

use crate::errors::{FgError, Result};
use crate::statistics::{checked, or_undefined, round_half_up, to_decimal, to_f64};
use ndarray::Array2;
use rust_decimal::{Decimal, MathematicalOps};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default no-data value when a grid header omits `NODATA_value`
pub const DEFAULT_NO_DATA_VALUE: f64 = -9999.0;

/// Read-only access to a 2D grid of doubles with a no-data sentinel
pub trait GridAccess {
    fn n_rows(&self) -> usize;
    fn n_cols(&self) -> usize;
    fn cell(&self, row: usize, col: usize) -> f64;
    fn no_data_value(&self) -> f64;

    fn is_no_data(&self, value: f64) -> bool {
        value == self.no_data_value() || value.is_nan()
    }
}

/// Header of an ESRI ASCII grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridHeader {
    pub n_cols: usize,
    pub n_rows: usize,
    pub x_lower_left: f64,
    pub y_lower_left: f64,
    pub cell_size: f64,
    pub no_data_value: f64,
}

/// A fully loaded ESRI ASCII grid
#[derive(Debug, Clone)]
pub struct AsciiGrid {
    pub header: GridHeader,
    cells: Array2<f64>,
}

impl AsciiGrid {
    /// Build a grid directly from cell values, e.g. for tests or other readers.
    pub fn from_array(cells: Array2<f64>, no_data_value: f64) -> Self {
        let (n_rows, n_cols) = cells.dim();
        Self {
            header: GridHeader {
                n_cols,
                n_rows,
                x_lower_left: 0.0,
                y_lower_left: 0.0,
                cell_size: 1.0,
                no_data_value,
            },
            cells,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FgError::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse grid text. `path` is only used for error reporting.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let malformed = |line: usize, message: String| FgError::MalformedRecord {
            path: PathBuf::from(path),
            line,
            message,
        };

        let mut n_cols = None;
        let mut n_rows = None;
        let mut x_lower_left = 0.0;
        let mut y_lower_left = 0.0;
        let mut cell_size = 1.0;
        let mut no_data_value = DEFAULT_NO_DATA_VALUE;

        let mut lines = text.lines().enumerate().peekable();
        while let Some((_, line)) = lines.peek() {
            let starts_with_key = line
                .trim_start()
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic());
            if !starts_with_key {
                break;
            }
            let (index, line) = lines.next().unwrap_or_default();
            let mut parts = line.split_whitespace();
            let key = parts.next().unwrap_or_default().to_ascii_lowercase();
            let raw = parts
                .next()
                .ok_or_else(|| malformed(index + 1, format!("header '{}' has no value", key)))?;
            let value: f64 = raw
                .parse()
                .map_err(|_| malformed(index + 1, format!("header '{}' value '{}'", key, raw)))?;
            match key.as_str() {
                "ncols" => n_cols = Some(value as usize),
                "nrows" => n_rows = Some(value as usize),
                "xllcorner" | "xllcenter" => x_lower_left = value,
                "yllcorner" | "yllcenter" => y_lower_left = value,
                "cellsize" => cell_size = value,
                "nodata_value" => no_data_value = value,
                other => return Err(malformed(index + 1, format!("unknown header '{}'", other))),
            }
        }

        let n_cols = n_cols.ok_or_else(|| malformed(1, "missing ncols".to_string()))?;
        let n_rows = n_rows.ok_or_else(|| malformed(1, "missing nrows".to_string()))?;

        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (index, line) in lines {
            for token in line.split_whitespace() {
                let value: f64 = token
                    .parse()
                    .map_err(|_| malformed(index + 1, format!("cell value '{}'", token)))?;
                values.push(value);
            }
        }
        if values.len() != n_rows * n_cols {
            return Err(malformed(
                text.lines().count(),
                format!(
                    "expected {} x {} = {} cells, found {}",
                    n_rows,
                    n_cols,
                    n_rows * n_cols,
                    values.len()
                ),
            ));
        }

        let cells = Array2::from_shape_vec((n_rows, n_cols), values)?;
        debug!("Loaded {} x {} grid from {}", n_rows, n_cols, path.display());

        Ok(Self {
            header: GridHeader {
                n_cols,
                n_rows,
                x_lower_left,
                y_lower_left,
                cell_size,
                no_data_value,
            },
            cells,
        })
    }
}

impl GridAccess for AsciiGrid {
    fn n_rows(&self) -> usize {
        self.header.n_rows
    }

    fn n_cols(&self) -> usize {
        self.header.n_cols
    }

    fn cell(&self, row: usize, col: usize) -> f64 {
        self.cells[[row, col]]
    }

    fn no_data_value(&self) -> f64 {
        self.header.no_data_value
    }
}

/// Simple summary over every non-sentinel cell, zeros and ones included
#[derive(Debug, Clone, PartialEq)]
pub struct GridSummary {
    pub n: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
    pub mean: Option<f64>,
    /// Sample standard deviation (divisor n - 1)
    pub standard_deviation: Option<f64>,
}

impl GridSummary {
    pub fn compute<G: GridAccess + ?Sized>(grid: &G) -> Result<Self> {
        let mut n = 0u64;
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut sum = Decimal::ZERO;

        for row in 0..grid.n_rows() {
            for col in 0..grid.n_cols() {
                let value = grid.cell(row, col);
                if grid.is_no_data(value) {
                    continue;
                }
                n += 1;
                min = Some(min.map_or(value, |m| m.min(value)));
                max = Some(max.map_or(value, |m| m.max(value)));
                sum = checked(sum.checked_add(to_decimal(value, "sum")?), "sum")?;
            }
        }

        let mean = or_undefined(Self::mean(sum, n))?;
        let standard_deviation = or_undefined(Self::standard_deviation(grid, sum, n))?;

        Ok(Self {
            n,
            min,
            max,
            sum: to_f64(round_half_up(sum, 10), "sum")?,
            mean: mean.map(|m| to_f64(m, "mean")).transpose()?,
            standard_deviation,
        })
    }

    fn mean(sum: Decimal, n: u64) -> Result<Decimal> {
        if n == 0 {
            return Err(FgError::undefined("mean", "grid has no data cells"));
        }
        let mean = checked(sum.checked_div(Decimal::from(n)), "mean")?;
        Ok(round_half_up(mean, 10))
    }

    fn standard_deviation<G: GridAccess + ?Sized>(grid: &G, sum: Decimal, n: u64) -> Result<f64> {
        if n < 2 {
            return Err(FgError::undefined(
                "standard deviation",
                format!("needs at least 2 data cells, found {}", n),
            ));
        }
        let mean = checked(sum.checked_div(Decimal::from(n)), "standard deviation")?;
        let mut squares = Decimal::ZERO;
        for row in 0..grid.n_rows() {
            for col in 0..grid.n_cols() {
                let value = grid.cell(row, col);
                if grid.is_no_data(value) {
                    continue;
                }
                let delta = checked(
                    to_decimal(value, "standard deviation")?.checked_sub(mean),
                    "standard deviation",
                )?;
                squares = checked(
                    squares.checked_add(checked(delta.checked_mul(delta), "standard deviation")?),
                    "standard deviation",
                )?;
            }
        }
        let variance = checked(
            squares.checked_div(Decimal::from(n - 1)),
            "standard deviation",
        )?;
        let deviation = variance.sqrt().ok_or_else(|| {
            FgError::undefined("standard deviation", "square root of variance failed")
        })?;
        to_f64(round_half_up(deviation, 10), "standard deviation")
    }
}
