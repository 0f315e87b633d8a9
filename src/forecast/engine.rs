//! Smart-persistence engine: clear-sky ratio at `t` carried to `t + Δt`.

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;
use tracing::{debug, warn};

use super::strategy::{ForecastStrategy, Strategy, StrategyKind};
use super::types::{Projection, Sample, SampleForecast};
use crate::config::ConfigError;
use crate::error::ForecastError;
use crate::irradiance::{IrradianceUnit, PanelGeometry, clear_sky_power};
use crate::solar::{Location, Resolver, ResolverKind, SolarPositionResolver};

/// Immutable engine configuration.
///
/// `Default` is the Stanford reference installation with the SPA resolver
/// and the ratio strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastConfig {
    /// Site of the array.
    pub location: Location,
    /// Panel orientation and size.
    pub panel: PanelGeometry,
    /// Forecast horizon in minutes.
    pub time_delta_minutes: u32,
    /// Meridian of the clock the timestamps follow.
    pub time_zone_reference_longitude: Option<f64>,
    /// Sun position back-end.
    pub resolver: ResolverKind,
    /// Projection strategy.
    pub strategy: StrategyKind,
    /// Unit clear-sky power is expressed in.
    pub irradiance_unit: IrradianceUnit,
}

impl ForecastConfig {
    /// Stanford site, SPA positions, plain ratio in W/m², 15 minute horizon.
    pub fn stanford() -> Self {
        Self {
            location: Location::stanford(),
            panel: PanelGeometry::stanford(),
            time_delta_minutes: 15,
            time_zone_reference_longitude: Some(-120.0),
            resolver: ResolverKind::Spa,
            strategy: StrategyKind::Ratio,
            irradiance_unit: IrradianceUnit::WattsPerSquareMeter,
        }
    }

    /// Stanford site, geometric positions, clipped ratio in kW/m².
    pub fn stanford_geometric() -> Self {
        Self {
            resolver: ResolverKind::Geometric,
            strategy: StrategyKind::Clipped,
            irradiance_unit: IrradianceUnit::KilowattsPerSquareMeter,
            ..Self::stanford()
        }
    }

    /// The forecast horizon.
    pub fn horizon(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.time_delta_minutes))
    }

    /// Meridian used to read timezone-naive timestamps: the configured
    /// reference, else the whole-hour meridian nearest the site.
    pub fn civil_reference_longitude(&self) -> f64 {
        self.time_zone_reference_longitude
            .unwrap_or_else(|| (self.location.longitude / 15.0).round() * 15.0)
    }

    /// Checks the settings the engine depends on.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a zero horizon or a geometric resolver
    /// without a reference meridian.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_delta_minutes == 0 {
            return Err(ConfigError::new(
                "forecast.time_delta_minutes",
                "must be > 0",
            ));
        }
        if self.resolver == ResolverKind::Geometric && self.time_zone_reference_longitude.is_none()
        {
            return Err(ConfigError::new(
                "forecast.time_zone_reference_longitude",
                "required by the geometric resolver",
            ));
        }
        Ok(())
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::stanford()
    }
}

/// Forecast engine over a sun position resolver and a projection strategy.
///
/// Generic for static dispatch; [`SmartPersistence::from_config`] builds
/// the run-time selected variant. Holds no mutable state, so one engine can
/// serve any number of batches.
#[derive(Debug, Clone)]
pub struct SmartPersistence<R = Resolver, S = Strategy> {
    location: Location,
    panel: PanelGeometry,
    horizon: TimeDelta,
    unit: IrradianceUnit,
    resolver: R,
    strategy: S,
}

impl SmartPersistence {
    /// Builds the engine selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when `config` fails [`ForecastConfig::validate`].
    pub fn from_config(config: &ForecastConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.location,
            config.panel,
            config.horizon(),
            config.irradiance_unit,
            Resolver::new(config.resolver, config.civil_reference_longitude()),
            Strategy::from(config.strategy),
        ))
    }
}

impl<R: SolarPositionResolver, S: ForecastStrategy> SmartPersistence<R, S> {
    /// Creates an engine from its parts.
    ///
    /// # Arguments
    ///
    /// * `location` - Site of the array
    /// * `panel` - Panel orientation and size
    /// * `horizon` - How far ahead to forecast
    /// * `unit` - Unit clear-sky power is expressed in
    /// * `resolver` - Sun position back-end
    /// * `strategy` - Projection strategy
    pub fn new(
        location: Location,
        panel: PanelGeometry,
        horizon: TimeDelta,
        unit: IrradianceUnit,
        resolver: R,
        strategy: S,
    ) -> Self {
        Self {
            location,
            panel,
            horizon,
            unit,
            resolver,
            strategy,
        }
    }

    /// The forecast horizon.
    pub fn horizon(&self) -> TimeDelta {
        self.horizon
    }

    /// Clear-sky power at `timestamp`, clamped at zero when the sun is below
    /// the horizon or behind the panel plane.
    ///
    /// # Errors
    ///
    /// Propagates resolver failures.
    pub fn clear_sky_at(&self, timestamp: &DateTime<FixedOffset>) -> Result<f64, ForecastError> {
        let position = self.resolver.resolve(timestamp, &self.location)?;
        Ok(clear_sky_power(&position, &self.panel, self.unit).max(0.0))
    }

    fn project(&self, sample: &Sample) -> Result<Projection, ForecastError> {
        let clear_now = self.clear_sky_at(&sample.timestamp)?;
        let clear_future = self.clear_sky_at(&(sample.timestamp + self.horizon))?;
        self.strategy
            .project(sample.actual_output, clear_now, clear_future)
    }

    /// Forecasts one sample; `index` is its position in the caller's batch.
    pub fn project_sample(&self, index: usize, sample: &Sample) -> SampleForecast {
        let outcome = self.project(sample);
        if let Err(e) = &outcome {
            warn!(
                index,
                timestamp = %sample.timestamp,
                kind = e.kind(),
                error = %e,
                "sample forecast failed"
            );
        }
        SampleForecast {
            index,
            timestamp: sample.timestamp,
            actual_output: sample.actual_output,
            outcome,
        }
    }

    /// Forecasts every sample. Output has the input's length and order;
    /// a failed sample never affects the others.
    pub fn run(&self, samples: &[Sample]) -> Vec<SampleForecast> {
        let forecasts = self.map_samples(samples);
        let failed = forecasts.iter().filter(|f| f.outcome.is_err()).count();
        debug!(
            samples = forecasts.len(),
            failed,
            resolver = self.resolver.name(),
            strategy = self.strategy.name(),
            horizon_minutes = self.horizon.num_minutes(),
            "smart persistence batch complete"
        );
        forecasts
    }

    #[cfg(not(feature = "parallel"))]
    fn map_samples(&self, samples: &[Sample]) -> Vec<SampleForecast> {
        samples
            .iter()
            .enumerate()
            .map(|(i, s)| self.project_sample(i, s))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn map_samples(&self, samples: &[Sample]) -> Vec<SampleForecast> {
        use rayon::prelude::*;

        samples
            .par_iter()
            .enumerate()
            .map(|(i, s)| self.project_sample(i, s))
            .collect()
    }
}

/// Forecasts PV output `Δt` ahead for each `(label, timestamp)` pair.
///
/// Returns one entry per input, in order; `None` marks a sample that could
/// not be forecast (the cause is logged).
///
/// # Errors
///
/// Returns a `ConfigError` if `config` is invalid.
///
/// # Panics
///
/// Panics if `labels` and `timestamps` differ in length.
pub fn forecast(
    labels: &[f64],
    timestamps: &[DateTime<FixedOffset>],
    config: &ForecastConfig,
) -> Result<Vec<Option<f64>>, ConfigError> {
    assert_eq!(
        labels.len(),
        timestamps.len(),
        "labels and timestamps must have the same length"
    );
    let engine = SmartPersistence::from_config(config)?;
    let samples: Vec<Sample> = timestamps
        .iter()
        .zip(labels)
        .map(|(ts, &y)| Sample::new(*ts, y))
        .collect();
    Ok(engine
        .run(&samples)
        .iter()
        .map(SampleForecast::prediction)
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::solar::SolarPosition;
    use crate::solar::time::attach_civil_offset;

    fn pacific(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<FixedOffset> {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(hh, mm, 0))
            .expect("valid test timestamp");
        attach_civil_offset(naive, -120.0)
    }

    /// Resolver that fails on a chosen minute and otherwise returns a fixed
    /// position.
    struct FailsAtMinute(u32);

    impl SolarPositionResolver for FailsAtMinute {
        fn resolve(
            &self,
            timestamp: &DateTime<FixedOffset>,
            _location: &Location,
        ) -> Result<SolarPosition, ForecastError> {
            use chrono::Timelike;
            if timestamp.minute() == self.0 {
                Err(ForecastError::geometry("injected"))
            } else {
                Ok(SolarPosition::new(30.0, 180.0))
            }
        }

        fn name(&self) -> &'static str {
            "fails-at-minute"
        }
    }

    fn stub_engine(fail_minute: u32) -> SmartPersistence<FailsAtMinute, Strategy> {
        SmartPersistence::new(
            Location::stanford(),
            PanelGeometry::stanford(),
            TimeDelta::minutes(15),
            IrradianceUnit::WattsPerSquareMeter,
            FailsAtMinute(fail_minute),
            Strategy::from(StrategyKind::Ratio),
        )
    }

    #[test]
    fn default_config_is_stanford() {
        let cfg = ForecastConfig::default();
        assert_eq!(cfg.location, Location::stanford());
        assert_eq!(cfg.panel.effective_area, 24.98);
        assert_eq!(cfg.horizon(), TimeDelta::minutes(15));
        assert_eq!(cfg.civil_reference_longitude(), -120.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn reference_meridian_falls_back_to_nearest_hour() {
        let cfg = ForecastConfig {
            time_zone_reference_longitude: None,
            ..ForecastConfig::default()
        };
        assert_eq!(cfg.civil_reference_longitude(), -120.0);
        assert!(cfg.validate().is_ok());

        let geo = ForecastConfig {
            time_zone_reference_longitude: None,
            ..ForecastConfig::stanford_geometric()
        };
        assert!(geo.validate().is_err());
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let cfg = ForecastConfig {
            time_delta_minutes: 0,
            ..ForecastConfig::default()
        };
        let err = SmartPersistence::from_config(&cfg).unwrap_err();
        assert_eq!(err.field, "forecast.time_delta_minutes");
    }

    #[test]
    fn failed_sample_does_not_affect_neighbours() {
        let engine = stub_engine(45);
        let samples = [
            Sample::new(pacific(2024, 6, 21, 12, 0), 500.0),
            // 12:30 + 15 min lands on the failing minute
            Sample::new(pacific(2024, 6, 21, 12, 30), 400.0),
            Sample::new(pacific(2024, 6, 21, 13, 0), 300.0),
        ];
        let out = engine.run(&samples);
        assert_eq!(out.len(), 3);
        // constant clear sky: the prediction equals the measurement
        assert!((out[0].prediction().unwrap_or_default() - 500.0).abs() < 1e-9);
        assert_eq!(out[1].prediction(), None);
        assert_eq!(out[1].error().map(ForecastError::kind), Some("geometry"));
        assert!((out[2].prediction().unwrap_or_default() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn output_preserves_input_order() {
        let engine = stub_engine(99);
        // deliberately not sorted by time
        let samples: Vec<Sample> = [13, 9, 17, 11, 10]
            .into_iter()
            .enumerate()
            .map(|(i, hh)| Sample::new(pacific(2024, 5, 1, hh, 0), i as f64))
            .collect();
        let out = engine.run(&samples);
        for (i, (f, s)) in out.iter().zip(&samples).enumerate() {
            assert_eq!(f.index, i);
            assert_eq!(f.timestamp, s.timestamp);
            assert_eq!(f.actual_output, s.actual_output);
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_run_preserves_order_and_failures() {
        let engine = stub_engine(45);
        // large enough for rayon to split the batch across workers
        let samples: Vec<Sample> = (0..4_096_i64)
            .map(|k| {
                let ts = pacific(2024, 5, 1, 0, 0) + TimeDelta::minutes(k);
                Sample::new(ts, k as f64)
            })
            .collect();
        let out = engine.run(&samples);
        assert_eq!(out.len(), samples.len());
        for (i, (f, s)) in out.iter().zip(&samples).enumerate() {
            assert_eq!(f.index, i);
            assert_eq!(f.timestamp, s.timestamp);
            assert_eq!(*f, engine.project_sample(i, s));
        }
        // minute 45 fails at `t`, minute 30 at `t + Δt`
        let failed = out.iter().filter(|f| f.outcome.is_err()).count();
        let expected = (0..4_096).filter(|k| k % 60 == 30 || k % 60 == 45).count();
        assert_eq!(failed, expected);
    }

    #[test]
    fn night_sample_fails_with_ratio_but_not_clipped() {
        // sun directly opposite a vertical panel: zero clear sky
        let panel = PanelGeometry::new(90.0, 0.0, 1.0, 1000.0).expect("valid panel");
        struct Overhead;
        impl SolarPositionResolver for Overhead {
            fn resolve(
                &self,
                _: &DateTime<FixedOffset>,
                _: &Location,
            ) -> Result<SolarPosition, ForecastError> {
                Ok(SolarPosition::new(0.0, 180.0))
            }
            fn name(&self) -> &'static str {
                "overhead"
            }
        }

        let sample = Sample::new(pacific(2024, 6, 21, 12, 0), 1.0);
        let ratio = SmartPersistence::new(
            Location::stanford(),
            panel,
            TimeDelta::minutes(15),
            IrradianceUnit::WattsPerSquareMeter,
            Overhead,
            Strategy::from(StrategyKind::Ratio),
        );
        let out = ratio.project_sample(0, &sample);
        assert_eq!(out.error().map(ForecastError::kind), Some("division_degenerate"));

        let clipped = SmartPersistence::new(
            Location::stanford(),
            panel,
            TimeDelta::minutes(15),
            IrradianceUnit::KilowattsPerSquareMeter,
            Overhead,
            Strategy::from(StrategyKind::Clipped),
        );
        assert!(clipped.project_sample(0, &sample).outcome.is_ok());
    }

    #[test]
    fn sun_below_horizon_never_yields_negative_forecast() {
        struct BelowHorizon;
        impl SolarPositionResolver for BelowHorizon {
            fn resolve(
                &self,
                _: &DateTime<FixedOffset>,
                _: &Location,
            ) -> Result<SolarPosition, ForecastError> {
                Ok(SolarPosition::new(120.0, 0.0))
            }
            fn name(&self) -> &'static str {
                "below-horizon"
            }
        }

        let sample = Sample::new(pacific(2024, 6, 21, 0, 0), 0.0);
        let clipped = SmartPersistence::new(
            Location::stanford(),
            PanelGeometry::stanford(),
            TimeDelta::minutes(15),
            IrradianceUnit::KilowattsPerSquareMeter,
            BelowHorizon,
            Strategy::from(StrategyKind::Clipped),
        );
        assert_eq!(clipped.clear_sky_at(&sample.timestamp), Ok(0.0));
        let p = clipped
            .project_sample(0, &sample)
            .outcome
            .expect("clipped never fails");
        assert_eq!(p.clear_sky_future, 0.0);
        assert_eq!(p.prediction, 0.0);

        let ratio = SmartPersistence::new(
            Location::stanford(),
            PanelGeometry::stanford(),
            TimeDelta::minutes(15),
            IrradianceUnit::WattsPerSquareMeter,
            BelowHorizon,
            Strategy::from(StrategyKind::Ratio),
        );
        let out = ratio.project_sample(0, &Sample::new(sample.timestamp, 300.0));
        assert_eq!(out.error().map(ForecastError::kind), Some("division_degenerate"));
    }

    #[test]
    fn forecast_entry_point_matches_engine() {
        let cfg = ForecastConfig::default();
        let ts = [pacific(2024, 6, 21, 11, 0), pacific(2024, 6, 21, 14, 0)];
        let out = forecast(&[400.0, 450.0], &ts, &cfg).expect("valid config");
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(Option::is_some));
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn forecast_entry_point_rejects_length_mismatch() {
        let ts = [pacific(2024, 6, 21, 11, 0)];
        let _ = forecast(&[1.0, 2.0], &ts, &ForecastConfig::default());
    }
}
