//! Line-oriented CSV output tables
//!
//! A [`CsvTable`] writes its header on creation and stays open while rows are
//! appended. Buffered rows are flushed by [`CsvTable::finish`] and, failing
//! that, when the table is dropped, so an early `?` return never leaves a
//! truncated file behind.

use crate::errors::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Token written in place of a statistic that is undefined for the input
pub const UNDEFINED: &str = "undefined";

pub struct CsvTable {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: usize,
}

impl CsvTable {
    /// Create (or truncate) `path`, creating parent directories, and write `header`.
    pub fn create(path: &Path, header: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", header)?;
        debug!("Opened output table {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn write_row<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let line = fields
            .iter()
            .map(|field| field.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.write_line(&line)
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close, reporting any write error.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        debug!("Closed output table {} ({} rows)", self.path.display(), self.rows);
        Ok(())
    }
}

impl Drop for CsvTable {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

/// Format a possibly undefined value for output.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => UNDEFINED.to_string(),
    }
}

/// Format a value that is legitimately absent (e.g. a column never inundated).
pub fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
