//! Defines command-line interface options using `clap` for the flood statistics binaries.

use crate::errors::{FgError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Both binaries take the same single optional argument
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Statistics over glacial outburst flood simulation output",
    long_about = "If no directory is given, the current working directory is the \
                  location where input data is expected to be and where output \
                  data is written."
)]
pub struct Args {
    /// Directory containing `input/` and receiving `output/`
    pub dir: Option<PathBuf>,
}

impl Args {
    /// Resolve the working directory, defaulting to the current directory.
    pub fn working_dir(&self) -> Result<PathBuf> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        if !dir.exists() {
            return Err(FgError::configuration(format!(
                "Directory {} does not exist",
                dir.display()
            )));
        }
        if !dir.is_dir() {
            return Err(FgError::configuration(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(dir)
    }
}
