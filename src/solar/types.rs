//! Site location and sun position types.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Geographic location of the PV installation.
///
/// # Examples
///
/// ```
/// use pv_persistence::solar::Location;
///
/// let site = Location::new(37.42808, -122.17023, 23.0).unwrap();
/// assert_eq!(site.latitude, 37.42808);
/// assert!(Location::new(91.0, 0.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees, positive north (-90 to +90).
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east (-180 to +180).
    pub longitude: f64,
    /// Altitude above sea level in meters.
    pub altitude: f64,
}

impl Location {
    /// Creates a location after checking the coordinate ranges.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first coordinate out of range.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Result<Self, ConfigError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ConfigError::new(
                "site.latitude",
                format!("must be in [-90, 90], got {latitude}"),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ConfigError::new(
                "site.longitude",
                format!("must be in [-180, 180], got {longitude}"),
            ));
        }
        if !altitude.is_finite() {
            return Err(ConfigError::new("site.altitude", "must be finite"));
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }

    /// The Stanford University installation of the SKIPP'D benchmark.
    pub fn stanford() -> Self {
        Self {
            latitude: 37.42808,
            longitude: -122.17023,
            altitude: 23.0,
        }
    }
}

/// Sun position as seen from a [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolarPosition {
    /// Angle between the sun and the local vertical, in [0, 180] degrees.
    pub zenith_deg: f64,
    /// Compass bearing of the sun, clockwise from north, in [0, 360) degrees.
    pub azimuth_deg: f64,
}

impl SolarPosition {
    /// Builds a position, normalising the azimuth into [0, 360).
    pub fn new(zenith_deg: f64, azimuth_deg: f64) -> Self {
        Self {
            zenith_deg,
            azimuth_deg: normalize_degrees(azimuth_deg),
        }
    }

    /// Elevation above the horizon (`90 - zenith`).
    pub fn elevation_deg(&self) -> f64 {
        90.0 - self.zenith_deg
    }
}

/// Normalises an angle in degrees to [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees % 360.0;
    let normalized = if normalized < 0.0 {
        normalized + 360.0
    } else {
        normalized
    };
    // tiny negative inputs round up to exactly 360 after the shift
    if normalized >= 360.0 { 0.0 } else { normalized }
}
