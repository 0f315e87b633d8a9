//! TOML-based run configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::forecast::{ForecastConfig, StrategyKind};
use crate::irradiance::{IrradianceUnit, PanelGeometry};
use crate::solar::{Location, ResolverKind};

/// Top-level run configuration parsed from TOML.
///
/// All fields default to the Stanford reference installation. Load from
/// TOML with [`RunConfig::from_toml_file`] or use [`RunConfig::stanford`]
/// for the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Where the array is.
    #[serde(default)]
    pub site: SiteConfig,
    /// How the array is mounted.
    #[serde(default)]
    pub panel: PanelConfig,
    /// Forecast horizon, time handling and algorithm choice.
    #[serde(default)]
    pub forecast: ForecastSettings,
}

/// Geographic position of the installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Latitude in decimal degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in decimal degrees (-180 to 180).
    pub longitude: f64,
    /// Altitude above sea level (m).
    pub altitude: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let site = Location::stanford();
        Self {
            latitude: site.latitude,
            longitude: site.longitude,
            altitude: site.altitude,
        }
    }
}

/// Panel orientation and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// Tilt above horizontal (degrees, 0 to 90).
    pub elevation_angle: f64,
    /// Facing direction clockwise from north (degrees, 0 to 360).
    pub azimuth_angle: f64,
    /// Effective collecting area (m²).
    pub effective_area: f64,
    /// Peak irradiance (W/m²).
    pub max_irradiance: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        let panel = PanelGeometry::stanford();
        Self {
            elevation_angle: panel.elevation_angle,
            azimuth_angle: panel.azimuth_angle,
            effective_area: panel.effective_area,
            max_irradiance: panel.max_irradiance,
        }
    }
}

/// Forecast parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSettings {
    /// Forecast horizon in minutes (must be > 0).
    pub time_delta_minutes: u32,
    /// Longitude of the meridian the timestamps' clock follows. Required by
    /// the geometric resolver.
    pub time_zone_reference_longitude: Option<f64>,
    /// Sun position back-end: `"spa"` or `"geometric"`.
    pub resolver: ResolverKind,
    /// Projection strategy: `"ratio"` or `"clipped"`.
    pub strategy: StrategyKind,
    /// Clear-sky unit: `"w"` or `"kw"`. Defaults per strategy when absent.
    pub irradiance_unit: Option<IrradianceUnit>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            time_delta_minutes: 15,
            time_zone_reference_longitude: Some(-120.0),
            resolver: ResolverKind::Spa,
            strategy: StrategyKind::Ratio,
            irradiance_unit: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"panel.effective_area"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    /// Creates an error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl RunConfig {
    /// Stanford reference: SPA positions, ratio projection in W/m².
    pub fn stanford() -> Self {
        Self {
            site: SiteConfig::default(),
            panel: PanelConfig::default(),
            forecast: ForecastSettings::default(),
        }
    }

    /// Stanford site with the self-contained geometry and the clipped
    /// relative strategy in kW/m².
    pub fn stanford_geometric() -> Self {
        Self {
            forecast: ForecastSettings {
                resolver: ResolverKind::Geometric,
                strategy: StrategyKind::Clipped,
                irradiance_unit: Some(IrradianceUnit::KilowattsPerSquareMeter),
                ..ForecastSettings::default()
            },
            ..Self::stanford()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["stanford", "stanford_geometric"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "stanford" => Ok(Self::stanford()),
            "stanford_geometric" => Ok(Self::stanford_geometric()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.location() {
            errors.push(e);
        }
        if let Err(e) = self.panel_geometry() {
            errors.push(e);
        }

        let f = &self.forecast;
        if f.time_delta_minutes == 0 {
            errors.push(ConfigError::new("forecast.time_delta_minutes", "must be > 0"));
        }
        match f.time_zone_reference_longitude {
            Some(lon) if !(-180.0..=180.0).contains(&lon) => errors.push(ConfigError::new(
                "forecast.time_zone_reference_longitude",
                format!("must be in [-180, 180], got {lon}"),
            )),
            None if f.resolver == ResolverKind::Geometric => errors.push(ConfigError::new(
                "forecast.time_zone_reference_longitude",
                "required by the geometric resolver",
            )),
            _ => {}
        }

        errors
    }

    /// Builds the immutable engine configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn to_forecast_config(&self) -> Result<ForecastConfig, ConfigError> {
        if let Some(first) = self.validate().into_iter().next() {
            return Err(first);
        }
        let f = &self.forecast;
        Ok(ForecastConfig {
            location: self.location()?,
            panel: self.panel_geometry()?,
            time_delta_minutes: f.time_delta_minutes,
            time_zone_reference_longitude: f.time_zone_reference_longitude,
            resolver: f.resolver,
            strategy: f.strategy,
            irradiance_unit: f
                .irradiance_unit
                .unwrap_or_else(|| f.strategy.default_unit()),
        })
    }

    fn location(&self) -> Result<Location, ConfigError> {
        Location::new(self.site.latitude, self.site.longitude, self.site.altitude)
    }

    fn panel_geometry(&self) -> Result<PanelGeometry, ConfigError> {
        let p = &self.panel;
        PanelGeometry::new(
            p.elevation_angle,
            p.azimuth_angle,
            p.effective_area,
            p.max_irradiance,
        )
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::stanford()
    }
}
