//! CSV import of measured samples.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::forecast::Sample;
use crate::solar::time::attach_civil_offset;

/// Column header expected in sample files.
pub const HEADER: &str = "timestamp,actual_output";

/// Accepted layouts for timezone-naive timestamps.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Why a sample file could not be read.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be opened.
    #[error("cannot read \"{}\": {source}", path.display())]
    Open {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// Malformed CSV or a field of the wrong type.
    #[error("malformed sample csv: {0}")]
    Csv(#[from] csv::Error),
    /// A well-formed row with an unusable value.
    #[error("line {line}: {message}")]
    Row {
        /// 1-based line number in the file.
        line: u64,
        /// What is wrong with the row.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawSample {
    timestamp: String,
    actual_output: f64,
}

/// Parses an RFC 3339 timestamp, or a naive wall-clock one read on the
/// meridian at `reference_longitude`.
///
/// # Examples
///
/// ```
/// use pv_persistence::io::import::parse_timestamp;
///
/// let aware = parse_timestamp("2024-06-21T12:00:00-07:00", -120.0).unwrap();
/// let naive = parse_timestamp("2024-06-21 12:00:00", -120.0).unwrap();
/// assert_eq!(aware, naive);
/// assert!(parse_timestamp("noon", -120.0).is_none());
/// ```
pub fn parse_timestamp(s: &str, reference_longitude: f64) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| attach_civil_offset(naive, reference_longitude))
}

/// Checks a measured output value: finite and non-negative.
///
/// # Errors
///
/// Returns a message describing the rejected value.
pub fn check_output(value: f64) -> Result<f64, String> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("actual_output must be a non-negative number, got {value}"))
    }
}

/// Reads samples from a CSV file with a [`HEADER`] row.
///
/// # Errors
///
/// Returns an `ImportError` if the file cannot be opened or any row is
/// invalid.
pub fn import_csv(path: &Path, reference_longitude: f64) -> Result<Vec<Sample>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(io::BufReader::new(file), reference_longitude)
}

/// Reads samples as CSV from any reader, keeping row order.
///
/// # Arguments
///
/// * `reader` - Source of CSV text with a header row
/// * `reference_longitude` - Meridian naive timestamps are read on
///
/// # Errors
///
/// Returns an `ImportError` naming the first invalid line.
pub fn read_csv(reader: impl Read, reference_longitude: f64) -> Result<Vec<Sample>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut samples = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let raw: RawSample = record.deserialize(Some(&headers))?;

        let timestamp = parse_timestamp(&raw.timestamp, reference_longitude).ok_or_else(|| {
            ImportError::Row {
                line,
                message: format!("unrecognised timestamp \"{}\"", raw.timestamp),
            }
        })?;
        let actual_output =
            check_output(raw.actual_output).map_err(|message| ImportError::Row { line, message })?;
        samples.push(Sample::new(timestamp, actual_output));
    }
    Ok(samples)
}
