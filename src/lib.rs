//! fluvial_glacial: statistics over glacial outburst flood simulation output
//!
//! Reduces the raster and time-series output of a hydrological flood model to
//! tabular CSV summaries for later visual analysis.
//!
//! ## Key Features
//!
//! - **Grid Statistics**: one 32-field record per hourly ESRI ASCII grid, covering
//!   summary statistics, quartiles, mode, moments, skewness, kurtosis, and
//!   interval diversity and dominance
//! - **Cross Sections**: row and column generalisation of depth, velocity, shear
//!   stress and Froude number series, with nested threshold tiers and time to peak
//! - **Exact Accumulation**: decimal arithmetic wherever rounding could move a
//!   quantile, mode or moment
//! - **Explicit Undefined Values**: degenerate statistics are written as
//!   `undefined`, never as NaN or infinity
//!
//! ## Module Organization
//!
//! - [`grid`]: ASCII grid reader and the [`GridAccess`](grid::GridAccess) trait
//! - [`statistics`]: frequency tables, moments, interval binning, diversity
//! - [`grid_statistics`]: per-grid records and the monthly run
//! - [`timeseries`]: cross-section CSV reader and timestamp arithmetic
//! - [`cross_section`]: cross-section accumulator and run
//! - [`output`]: CSV tables
//! - [`config`]: run parameters
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use fluvial_glacial::prelude::*;
//! use std::path::Path;
//!
//! let run = GridStatisticsRun::new(GridRunConfig::default(), Path::new("/data/flood")).unwrap();
//! for month in run.run().unwrap() {
//!     println!("{}: {} rows", month.month, month.rows.len());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod cross_section;
pub mod errors;
pub mod grid;
pub mod grid_statistics;
pub mod output;
pub mod statistics;
pub mod timeseries;

pub use errors::*;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::{CrossSectionConfig, GridRunConfig, MonthSchedule, Quantity};
    pub use crate::cross_section::{CrossSectionAccumulator, CrossSectionRun, RunReport};
    pub use crate::errors::{FgError, Result};
    pub use crate::grid::{AsciiGrid, GridAccess, GridSummary};
    pub use crate::grid_statistics::{
        GridStatisticsReducer, GridStatisticsRun, MonthReport, StatisticsRecord,
    };
    pub use crate::statistics::{IntervalBinner, IntervalFrequencyTable, ValueFrequencyTable};
    pub use crate::timeseries::{time_to_max, CrossSectionSeries, Timestamp};
}
