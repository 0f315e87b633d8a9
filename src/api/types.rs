//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::forecast::SampleForecast;
use crate::metrics::ForecastReport;

/// Body of `POST /forecast`: parallel arrays of measurements and times.
///
/// Timestamps are RFC 3339 strings, or naive `YYYY-MM-DD HH:MM:SS` read on
/// the configured reference meridian.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastRequest {
    /// Measured output at each timestamp.
    pub labels: Vec<f64>,
    /// When each measurement was taken.
    pub timestamps: Vec<String>,
}

/// Response of `POST /forecast`, one entry per input sample.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Forecast at `t + Δt`, `null` where the sample failed.
    pub predictions: Vec<Option<f64>>,
    /// Failure text, `null` where the sample succeeded.
    pub errors: Vec<Option<String>>,
    /// Accuracy against observations inside the request.
    pub report: ForecastReport,
}

impl ForecastResponse {
    /// Splits engine output into the parallel response arrays.
    pub fn new(forecasts: &[SampleForecast], report: ForecastReport) -> Self {
        Self {
            predictions: forecasts.iter().map(SampleForecast::prediction).collect(),
            errors: forecasts
                .iter()
                .map(|f| f.error().map(ToString::to_string))
                .collect(),
            report,
        }
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
