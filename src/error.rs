//! Error types for the daily-file aggregation pipeline.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while aggregating daily export files.
///
/// All variants are fatal for the run: the aggregation stops at the first
/// error, with no skip-and-continue behavior.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The expected daily file is absent from the data directory.
    #[error("data file not found for day {day} (expected {})", .path.display())]
    MissingDataFile { day: NaiveDate, path: PathBuf },

    /// The first line of the daily file does not carry the day marker.
    #[error("data file for day {day} is not a valid daily export ({})", .path.display())]
    InvalidFileFormat { day: NaiveDate, path: PathBuf },

    /// A header label is not a member of the canonical column order.
    /// Silently ignoring it would corrupt downstream column alignment.
    #[error("unknown column label \"{label}\" in header for day {day}")]
    UnknownColumnLabel { label: String, day: NaiveDate },

    /// A data line's leading `HH:MM` label does not match the slot
    /// expected at that position in the file.
    #[error("timestamp discontinuity on day {day}: expected slot {expected}, found \"{found}\"")]
    TimestampDiscontinuity {
        day: NaiveDate,
        expected: String,
        found: String,
    },

    /// I/O failure while reading a daily file.
    #[error("failed to read daily file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for aggregation operations.
pub type AggregateResult<T> = Result<T, AggregateError>;
