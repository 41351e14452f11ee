//! Centralized error handling for the flood statistics pipeline
//!
//! Every fallible operation in the crate returns [`Result`]. The variants follow
//! the pipeline's failure taxonomy: configuration problems are fatal, while
//! missing inputs, malformed records, undefined statistics and cross-date time
//! arithmetic are reported per file so the outer loops can log and carry on.

use std::fmt;
use std::path::PathBuf;

/// Main error type for flood statistics operations
#[derive(Debug)]
pub enum FgError {
    /// Wrong argument count, missing working directory or invalid run parameters
    Configuration { message: String },

    /// An expected per-hour grid or per-cross-section CSV file is absent
    MissingInputFile { path: PathBuf },

    /// A header, timestamp or cell that could not be parsed
    MalformedRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A statistic whose denominator is degenerate (n, variety or moment2)
    UndefinedStatistic {
        statistic: &'static str,
        reason: String,
    },

    /// Inundation and max timestamps fall on different calendar dates
    TimeArithmeticMismatch { inundation: String, max: String },

    /// I/O operation errors
    Io(std::io::Error),

    /// Array shape or dimension error
    Array(ndarray::ShapeError),

    /// Generic error
    Generic(String),
}

impl FgError {
    pub fn configuration(message: impl Into<String>) -> Self {
        FgError::Configuration {
            message: message.into(),
        }
    }

    pub fn undefined(statistic: &'static str, reason: impl Into<String>) -> Self {
        FgError::UndefinedStatistic {
            statistic,
            reason: reason.into(),
        }
    }

    /// Whether the outer processing loops may log this error and continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FgError::Configuration { .. })
    }
}

impl fmt::Display for FgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FgError::Configuration { message } => write!(f, "Configuration error: {}", message),
            FgError::MissingInputFile { path } => {
                write!(f, "Input file {} does not exist", path.display())
            }
            FgError::MalformedRecord {
                path,
                line,
                message,
            } => write!(
                f,
                "Malformed record in {} at line {}: {}",
                path.display(),
                line,
                message
            ),
            FgError::UndefinedStatistic { statistic, reason } => {
                write!(f, "Statistic '{}' is undefined: {}", statistic, reason)
            }
            FgError::TimeArithmeticMismatch { inundation, max } => write!(
                f,
                "Cannot compute time to max across dates: inundation '{}', max '{}'",
                inundation, max
            ),
            FgError::Io(e) => write!(f, "I/O error: {}", e),
            FgError::Array(e) => write!(f, "Array error: {}", e),
            FgError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FgError::Io(e) => Some(e),
            FgError::Array(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FgError {
    fn from(error: std::io::Error) -> Self {
        FgError::Io(error)
    }
}

impl From<ndarray::ShapeError> for FgError {
    fn from(error: ndarray::ShapeError) -> Self {
        FgError::Array(error)
    }
}

impl From<String> for FgError {
    fn from(error: String) -> Self {
        FgError::Generic(error)
    }
}

impl From<&str> for FgError {
    fn from(error: &str) -> Self {
        FgError::Generic(error.to_string())
    }
}

/// Result type alias for flood statistics operations
pub type Result<T> = std::result::Result<T, FgError>;
