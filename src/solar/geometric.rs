//! Self-contained sun position from hour angle and declination.
//!
//! No equation-of-time or refraction terms: accuracy is a few degrees, which
//! is enough for a clear-sky ratio that is divided back out.

use std::f64::consts::{PI, TAU};

use chrono::{DateTime, FixedOffset};

use super::time::{SolarTime, civil_wall_clock, localize};
use super::{Location, SolarPosition, SolarPositionResolver};
use crate::error::ForecastError;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SOLAR_NOON_SECONDS: f64 = 43_200.0;
/// Axial tilt used for the declination sine model (degrees).
const OBLIQUITY_DEG: f64 = 23.44;
/// Day of year of the March equinox in the declination model.
const EQUINOX_DAY: f64 = 80.0;

/// Resolver that computes sun position from first principles.
///
/// Timestamps are read as civil time on `reference_longitude` and corrected
/// to true local solar time before the geometry is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricResolver {
    /// Longitude of the meridian the input clock follows (degrees).
    pub reference_longitude: f64,
}

impl GeometricResolver {
    /// Creates a resolver for clocks that follow `reference_longitude`.
    pub fn new(reference_longitude: f64) -> Self {
        Self {
            reference_longitude,
        }
    }
}

impl SolarPositionResolver for GeometricResolver {
    fn resolve(
        &self,
        timestamp: &DateTime<FixedOffset>,
        location: &Location,
    ) -> Result<SolarPosition, ForecastError> {
        let wall_clock = civil_wall_clock(timestamp, self.reference_longitude);
        let solar_time = localize(wall_clock, location.longitude, self.reference_longitude);
        sun_position(solar_time, location.latitude)
    }

    fn name(&self) -> &'static str {
        "geometric"
    }
}

/// Hour angle in radians, zero at local solar noon and positive afternoons.
pub fn hour_angle(seconds_of_day: u32) -> f64 {
    TAU * (f64::from(seconds_of_day) - SOLAR_NOON_SECONDS) / SECONDS_PER_DAY
}

/// Solar declination in radians.
pub fn declination(day_of_year: u32) -> f64 {
    let season = (360.0 / 365.25 * (f64::from(day_of_year) - EQUINOX_DAY)).to_radians();
    (OBLIQUITY_DEG * season.sin()).to_radians()
}

/// Picks the azimuth quadrant from the signs of the hour angle and of
/// `tan(azimuth)`. Returns radians.
///
/// An hour angle of exactly zero is handled like a morning one, which puts
/// the sun due south at solar noon even where it actually culminates north.
pub fn resolve_azimuth(hour_angle: f64, tan_azimuth: f64) -> f64 {
    let base = tan_azimuth.atan();
    match (hour_angle > 0.0, tan_azimuth > 0.0) {
        (true, true) => PI + base,
        (true, false) => TAU + base,
        (false, true) => base,
        (false, false) => PI + base,
    }
}

/// Sun position at `latitude` (degrees) for a given true local solar time.
///
/// # Errors
///
/// Returns [`ForecastError::Geometry`] when the azimuth denominator
/// `sin(lat)·cos(h) − cos(lat)·tan(δ)` is zero or not finite.
pub fn sun_position(solar_time: SolarTime, latitude: f64) -> Result<SolarPosition, ForecastError> {
    let h = hour_angle(solar_time.seconds_of_day);
    let delta = declination(solar_time.day_of_year);
    let phi = latitude.to_radians();

    let cos_zenith = delta.sin() * phi.sin() + delta.cos() * phi.cos() * h.cos();
    let zenith = cos_zenith.clamp(-1.0, 1.0).acos();

    let denominator = phi.sin() * h.cos() - phi.cos() * delta.tan();
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(ForecastError::geometry(format!(
            "azimuth undefined at latitude {latitude}° (day {}, second {})",
            solar_time.day_of_year, solar_time.seconds_of_day
        )));
    }
    let azimuth = resolve_azimuth(h, h.sin() / denominator);

    Ok(SolarPosition::new(zenith.to_degrees(), azimuth.to_degrees()))
}
