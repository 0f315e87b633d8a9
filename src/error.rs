//! Per-sample forecast failures.

use thiserror::Error;

/// Why a single sample could not be forecast.
///
/// Failures are recorded on the sample they belong to; the rest of the batch
/// is still evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// The sun/panel geometry has no defined answer (e.g. the azimuth
    /// denominator vanished).
    #[error("degenerate solar geometry: {message}")]
    Geometry {
        /// What went wrong.
        message: String,
    },
    /// The clear-sky reference used as a divisor is (numerically) zero.
    #[error("clear-sky reference {clear_sky} is too close to zero to divide by")]
    DivisionDegenerate {
        /// The offending clear-sky value.
        clear_sky: f64,
    },
    /// The astronomical position provider rejected the request.
    #[error("solar position provider failed: {0}")]
    Provider(#[from] solar_positioning::Error),
}

impl ForecastError {
    /// Shorthand for a [`ForecastError::Geometry`] failure.
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// Stable lowercase name of the error kind, used in CSV and API output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Geometry { .. } => "geometry",
            Self::DivisionDegenerate { .. } => "division_degenerate",
            Self::Provider(_) => "provider",
        }
    }
}
