//! Sun position resolution.
//!
//! Two interchangeable back-ends implement [`SolarPositionResolver`]:
//! [`SpaResolver`] delegates to the NREL SPA implementation of the
//! `solar-positioning` crate, [`GeometricResolver`] computes the position
//! itself from hour angle and declination. [`Resolver`] dispatches between
//! them at run time.

/// Self-contained hour-angle/declination resolver.
pub mod geometric;
/// Library-backed SPA resolver.
pub mod spa;
/// Civil clock to true local solar time.
pub mod time;
pub mod types;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

pub use geometric::GeometricResolver;
pub use spa::SpaResolver;
pub use types::{Location, SolarPosition, normalize_degrees};

/// Source of sun positions for a timestamp and location.
///
/// Implementations are stateless and shareable across threads.
pub trait SolarPositionResolver: Send + Sync {
    /// Returns the sun position at `timestamp` seen from `location`.
    ///
    /// # Errors
    ///
    /// [`ForecastError::Geometry`] for degenerate geometry,
    /// [`ForecastError::Provider`] when an external provider fails.
    fn resolve(
        &self,
        timestamp: &DateTime<FixedOffset>,
        location: &Location,
    ) -> Result<SolarPosition, ForecastError>;

    /// Short name of the back-end, used in logs.
    fn name(&self) -> &'static str;
}

/// Which resolver back-end a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// NREL SPA via `solar-positioning`.
    Spa,
    /// Self-contained geometry with time correction.
    Geometric,
}

impl ResolverKind {
    /// Accepted configuration names.
    pub const NAMES: &[&str] = &["spa", "geometric"];
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spa => f.write_str("spa"),
            Self::Geometric => f.write_str("geometric"),
        }
    }
}

impl FromStr for ResolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spa" => Ok(Self::Spa),
            "geometric" => Ok(Self::Geometric),
            other => Err(format!(
                "must be one of {}, got \"{other}\"",
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Run-time choice between the resolver back-ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolver {
    /// Library-backed SPA.
    Spa(SpaResolver),
    /// Self-contained geometry.
    Geometric(GeometricResolver),
}

impl Resolver {
    /// Builds the resolver for `kind`. The geometric back-end needs the
    /// longitude of the meridian the timestamps' clock follows.
    pub fn new(kind: ResolverKind, reference_longitude: f64) -> Self {
        match kind {
            ResolverKind::Spa => Self::Spa(SpaResolver),
            ResolverKind::Geometric => Self::Geometric(GeometricResolver::new(reference_longitude)),
        }
    }
}

impl SolarPositionResolver for Resolver {
    fn resolve(
        &self,
        timestamp: &DateTime<FixedOffset>,
        location: &Location,
    ) -> Result<SolarPosition, ForecastError> {
        match self {
            Self::Spa(r) => r.resolve(timestamp, location),
            Self::Geometric(r) => r.resolve(timestamp, location),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Spa(r) => r.name(),
            Self::Geometric(r) => r.name(),
        }
    }
}
