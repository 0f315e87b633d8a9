//! Clear-sky power on a tilted panel.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::solar::SolarPosition;

/// Orientation and size of the PV array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelGeometry {
    /// Tilt of the panel above the horizontal (degrees, 0 to 90).
    pub elevation_angle: f64,
    /// Compass bearing the panel faces, clockwise from north (degrees, 0 to 360).
    pub azimuth_angle: f64,
    /// Effective collecting area (m², > 0).
    pub effective_area: f64,
    /// Clear-sky irradiance at normal incidence (W/m², > 0).
    pub max_irradiance: f64,
}

impl PanelGeometry {
    /// Creates a panel geometry after checking every field's range.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid field.
    pub fn new(
        elevation_angle: f64,
        azimuth_angle: f64,
        effective_area: f64,
        max_irradiance: f64,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=90.0).contains(&elevation_angle) {
            return Err(ConfigError::new(
                "panel.elevation_angle",
                format!("must be in [0, 90], got {elevation_angle}"),
            ));
        }
        if !(0.0..=360.0).contains(&azimuth_angle) {
            return Err(ConfigError::new(
                "panel.azimuth_angle",
                format!("must be in [0, 360], got {azimuth_angle}"),
            ));
        }
        if !(effective_area > 0.0 && effective_area.is_finite()) {
            return Err(ConfigError::new("panel.effective_area", "must be > 0"));
        }
        if !(max_irradiance > 0.0 && max_irradiance.is_finite()) {
            return Err(ConfigError::new("panel.max_irradiance", "must be > 0"));
        }
        Ok(Self {
            elevation_angle,
            azimuth_angle,
            effective_area,
            max_irradiance,
        })
    }

    /// The Stanford array of the SKIPP'D benchmark: 22.5° tilt facing 195°,
    /// 24.98 m² effective area, 1000 W/m² peak irradiance.
    pub fn stanford() -> Self {
        Self {
            elevation_angle: 22.5,
            azimuth_angle: 195.0,
            effective_area: 24.98,
            max_irradiance: 1000.0,
        }
    }

    /// Peak irradiance expressed in `unit`.
    pub fn peak_irradiance(&self, unit: IrradianceUnit) -> f64 {
        match unit {
            IrradianceUnit::WattsPerSquareMeter => self.max_irradiance,
            IrradianceUnit::KilowattsPerSquareMeter => self.max_irradiance / 1000.0,
        }
    }
}

/// Unit clear-sky power is expressed in.
///
/// Configuration always carries `max_irradiance` in W/m²; the conversion
/// happens only inside [`clear_sky_power`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrradianceUnit {
    /// Raw W/m²: power comes out in W.
    #[serde(rename = "w")]
    WattsPerSquareMeter,
    /// Normalised kW/m²: power comes out in kW.
    #[serde(rename = "kw")]
    KilowattsPerSquareMeter,
}

/// Theoretical clear-sky power striking the panel.
///
/// Cosine of the incidence angle between the sun and the panel normal,
/// scaled by peak irradiance and effective area. Negative when the sun is
/// behind the panel plane; callers decide how to clamp.
///
/// # Examples
///
/// ```
/// use pv_persistence::irradiance::{IrradianceUnit, PanelGeometry, clear_sky_power};
/// use pv_persistence::solar::SolarPosition;
///
/// let flat = PanelGeometry::new(0.0, 180.0, 2.0, 1000.0).unwrap();
/// let overhead = SolarPosition::new(0.0, 180.0);
/// let kw = clear_sky_power(&overhead, &flat, IrradianceUnit::KilowattsPerSquareMeter);
/// assert!((kw - 2.0).abs() < 1e-12);
/// ```
pub fn clear_sky_power(
    position: &SolarPosition,
    panel: &PanelGeometry,
    unit: IrradianceUnit,
) -> f64 {
    let zenith = position.zenith_deg.to_radians();
    let sun_azimuth = position.azimuth_deg.to_radians();
    let tilt = panel.elevation_angle.to_radians();
    let facing = panel.azimuth_angle.to_radians();

    let cos_incidence =
        tilt.cos() * zenith.cos() + tilt.sin() * zenith.sin() * (sun_azimuth - facing).cos();
    panel.peak_irradiance(unit) * panel.effective_area * cos_incidence
}
