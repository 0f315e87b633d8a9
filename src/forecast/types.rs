//! Input samples and per-sample forecast results.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;

use crate::error::ForecastError;
use crate::solar::time::attach_civil_offset;

/// One measured output at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// When the output was measured.
    pub timestamp: DateTime<FixedOffset>,
    /// Measured PV output (non-negative).
    pub actual_output: f64,
}

impl Sample {
    /// Creates a sample from a timezone-aware timestamp.
    pub fn new(timestamp: DateTime<FixedOffset>, actual_output: f64) -> Self {
        Self {
            timestamp,
            actual_output,
        }
    }

    /// Creates a sample from a wall-clock reading on the meridian at
    /// `reference_longitude`, attaching its civil UTC offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use pv_persistence::forecast::Sample;
    ///
    /// let clock = NaiveDate::from_ymd_opt(2024, 1, 15)
    ///     .unwrap()
    ///     .and_hms_opt(12, 0, 0)
    ///     .unwrap();
    /// let sample = Sample::from_wall_clock(clock, 310.0, -120.0);
    /// assert_eq!(sample.timestamp.offset().local_minus_utc(), -8 * 3600);
    /// ```
    pub fn from_wall_clock(
        wall_clock: NaiveDateTime,
        actual_output: f64,
        reference_longitude: f64,
    ) -> Self {
        Self::new(
            attach_civil_offset(wall_clock, reference_longitude),
            actual_output,
        )
    }
}

/// The three values a successful projection yields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Forecast output at `t + Δt`.
    pub prediction: f64,
    /// Clear-sky power at `t + Δt`.
    pub clear_sky_future: f64,
    /// Ratio (or clipped relative ratio) of actual to clear-sky output at `t`.
    pub clear_sky_index: f64,
}

/// Forecast outcome for one input sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleForecast {
    /// Position of the sample in the input batch.
    pub index: usize,
    /// Timestamp of the input sample (the forecast targets `timestamp + Δt`).
    pub timestamp: DateTime<FixedOffset>,
    /// Measured output at `timestamp`.
    pub actual_output: f64,
    /// Projection, or why this sample could not be forecast.
    pub outcome: Result<Projection, ForecastError>,
}

impl SampleForecast {
    /// The forecast value, if the sample succeeded.
    pub fn prediction(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|p| p.prediction)
    }

    /// The failure, if the sample failed.
    pub fn error(&self) -> Option<&ForecastError> {
        self.outcome.as_ref().err()
    }
}

impl fmt::Display for SampleForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(p) => write!(
                f,
                "#{:>4} {} | actual={:>9.3}  csi={:>6.3}  clear(t+Δt)={:>9.3}  forecast={:>9.3}",
                self.index,
                self.timestamp.format("%Y-%m-%d %H:%M:%S%:z"),
                self.actual_output,
                p.clear_sky_index,
                p.clear_sky_future,
                p.prediction,
            ),
            Err(e) => write!(
                f,
                "#{:>4} {} | actual={:>9.3}  FAILED ({}): {e}",
                self.index,
                self.timestamp.format("%Y-%m-%d %H:%M:%S%:z"),
                self.actual_output,
                e.kind(),
            ),
        }
    }
}
