//! Synthetic PV measurements with temporally correlated cloud cover.
//!
//! Clear-sky power is modulated by an AR(1) cloud multiplier:
//! ```text
//! m(t) = alpha * m(t-1) + (1 - alpha) * (1 + epsilon(t))
//! ```
//! where `epsilon` is Gaussian noise. The multiplier is clamped to
//! \[0.2, 1.2\] and starts at 1.

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::forecast::{ForecastConfig, Sample};
use crate::irradiance::clear_sky_power;
use crate::solar::time::attach_civil_offset;
use crate::solar::{Resolver, SolarPositionResolver};

const MULTIPLIER_MIN: f64 = 0.2;
const MULTIPLIER_MAX: f64 = 1.2;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Generates a zero-mean Gaussian sample via the Box-Muller transform.
///
/// Returns `0.0` when `std_dev <= 0.0`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    z0 * std_dev
}

/// One civil day of synthetic measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDay {
    /// Calendar day, read on the configured reference meridian.
    pub date: NaiveDate,
    /// Minutes between samples (must be > 0).
    pub step_minutes: u32,
    /// AR(1) correlation coefficient (0.0 = uncorrelated, 1.0 = fully persistent).
    pub cloud_alpha: f64,
    /// Standard deviation of the AR(1) innovation noise.
    pub cloud_noise_std: f64,
    /// Random seed; the same seed yields the same day.
    pub seed: u64,
}

impl SyntheticDay {
    /// A day sampled every 5 minutes with moderately persistent clouds.
    pub fn new(date: NaiveDate, seed: u64) -> Self {
        Self {
            date,
            step_minutes: 5,
            cloud_alpha: 0.9,
            cloud_noise_std: 0.2,
            seed,
        }
    }

    /// Produces the day's samples from midnight, in time order.
    ///
    /// Measured output is clear-sky power (clamped at zero) times the cloud
    /// multiplier. Timestamps whose sun position cannot be resolved are
    /// treated as dark.
    ///
    /// # Panics
    ///
    /// Panics if `step_minutes` is zero.
    pub fn generate(&self, config: &ForecastConfig) -> Vec<Sample> {
        assert!(self.step_minutes > 0, "step_minutes must be > 0");

        let reference = config.civil_reference_longitude();
        let resolver = Resolver::new(config.resolver, reference);
        let alpha = self.cloud_alpha.clamp(0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut multiplier = 1.0_f64;

        let midnight = self.date.and_time(NaiveTime::MIN);
        let steps = MINUTES_PER_DAY.div_ceil(self.step_minutes);

        (0..steps)
            .map(|k| {
                let wall_clock =
                    midnight + TimeDelta::minutes(i64::from(k * self.step_minutes));
                let timestamp = attach_civil_offset(wall_clock, reference);

                let epsilon = gaussian_noise(&mut rng, self.cloud_noise_std);
                multiplier = alpha * multiplier + (1.0 - alpha) * (1.0 + epsilon);
                multiplier = multiplier.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);

                let clear = match resolver.resolve(&timestamp, &config.location) {
                    Ok(position) => {
                        clear_sky_power(&position, &config.panel, config.irradiance_unit).max(0.0)
                    }
                    Err(e) => {
                        debug!(%timestamp, error = %e, "synthetic sample treated as dark");
                        0.0
                    }
                };
                Sample::new(timestamp, clear * multiplier)
            })
            .collect()
    }
}
