//! Sun position from the NREL Solar Position Algorithm.

use chrono::{DateTime, FixedOffset};
use solar_positioning::spa;
use solar_positioning::time::DeltaT;

use super::{Location, SolarPosition, SolarPositionResolver};
use crate::error::ForecastError;

/// Resolver backed by the `solar-positioning` SPA implementation.
///
/// Uses the true (unrefracted) elevation and an estimated ΔT for the
/// timestamp's year and month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpaResolver;

impl SolarPositionResolver for SpaResolver {
    fn resolve(
        &self,
        timestamp: &DateTime<FixedOffset>,
        location: &Location,
    ) -> Result<SolarPosition, ForecastError> {
        let delta_t = DeltaT::estimate_from_date_like(*timestamp)?;
        let position = spa::solar_position(
            *timestamp,
            location.latitude,
            location.longitude,
            location.altitude,
            delta_t,
            None,
        )?;
        let zenith = 90.0 - position.elevation_angle();
        Ok(SolarPosition::new(zenith, position.azimuth()))
    }

    fn name(&self) -> &'static str {
        "spa"
    }
}
