//! Ways of projecting the current clear-sky ratio onto the horizon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::Projection;
use crate::error::ForecastError;
use crate::irradiance::IrradianceUnit;

/// Clear-sky power at or below which the ratio strategy refuses to divide.
pub const MIN_CLEAR_SKY: f64 = 1e-12;
/// Floor applied to both the measurement and the clear-sky value.
pub const CLIP_FLOOR: f64 = 0.05;
/// Upper bound on the clipped relative ratio.
pub const CLIP_CEILING: f64 = 1.5;

/// Turns a measurement and two clear-sky values into a projection.
pub trait ForecastStrategy: Send + Sync {
    /// Projects `actual` (measured at `t`) to `t + Δt`.
    ///
    /// # Arguments
    ///
    /// * `actual` - Measured output at `t`
    /// * `clear_now` - Clear-sky power at `t`
    /// * `clear_future` - Clear-sky power at `t + Δt`
    ///
    /// # Errors
    ///
    /// Implementations may return [`ForecastError::DivisionDegenerate`].
    fn project(
        &self,
        actual: f64,
        clear_now: f64,
        clear_future: f64,
    ) -> Result<Projection, ForecastError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Plain clear-sky ratio: `actual / clear_now · clear_future`.
///
/// Fails when `clear_now` is not positive (night, sun on or behind the panel
/// plane).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatioProjection;

impl ForecastStrategy for RatioProjection {
    fn project(
        &self,
        actual: f64,
        clear_now: f64,
        clear_future: f64,
    ) -> Result<Projection, ForecastError> {
        if clear_now <= MIN_CLEAR_SKY {
            return Err(ForecastError::DivisionDegenerate {
                clear_sky: clear_now,
            });
        }
        let ratio = actual / clear_now;
        if !ratio.is_finite() {
            return Err(ForecastError::DivisionDegenerate {
                clear_sky: clear_now,
            });
        }
        Ok(Projection {
            prediction: ratio * clear_future,
            clear_sky_future: clear_future,
            clear_sky_index: ratio,
        })
    }

    fn name(&self) -> &'static str {
        "ratio"
    }
}

/// Ratio with both operands floored at [`CLIP_FLOOR`] and the result capped
/// at [`CLIP_CEILING`]. Never fails.
///
/// # Examples
///
/// ```
/// use pv_persistence::forecast::{ClippedRelative, ForecastStrategy};
///
/// // night: both floored, ratio 1
/// let p = ClippedRelative.project(0.0, -3.0, 2.0).unwrap();
/// assert_eq!(p.clear_sky_index, 1.0);
/// assert_eq!(p.prediction, 2.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClippedRelative;

impl ForecastStrategy for ClippedRelative {
    fn project(
        &self,
        actual: f64,
        clear_now: f64,
        clear_future: f64,
    ) -> Result<Projection, ForecastError> {
        let relative = (actual.max(CLIP_FLOOR) / clear_now.max(CLIP_FLOOR)).min(CLIP_CEILING);
        Ok(Projection {
            prediction: relative * clear_future,
            clear_sky_future: clear_future,
            clear_sky_index: relative,
        })
    }

    fn name(&self) -> &'static str {
        "clipped"
    }
}

/// Which projection strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// [`RatioProjection`].
    Ratio,
    /// [`ClippedRelative`].
    Clipped,
}

impl StrategyKind {
    /// Accepted configuration names.
    pub const NAMES: &[&str] = &["ratio", "clipped"];

    /// Clear-sky unit the strategy is calibrated for.
    ///
    /// The ratio cancels the unit out; the clipped guards are in kW.
    pub fn default_unit(self) -> IrradianceUnit {
        match self {
            Self::Ratio => IrradianceUnit::WattsPerSquareMeter,
            Self::Clipped => IrradianceUnit::KilowattsPerSquareMeter,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ratio => f.write_str("ratio"),
            Self::Clipped => f.write_str("clipped"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ratio" => Ok(Self::Ratio),
            "clipped" => Ok(Self::Clipped),
            other => Err(format!(
                "must be one of {}, got \"{other}\"",
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Run-time choice between the strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Plain ratio.
    Ratio(RatioProjection),
    /// Clipped relative ratio.
    Clipped(ClippedRelative),
}

impl From<StrategyKind> for Strategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Ratio => Self::Ratio(RatioProjection),
            StrategyKind::Clipped => Self::Clipped(ClippedRelative),
        }
    }
}

impl ForecastStrategy for Strategy {
    fn project(
        &self,
        actual: f64,
        clear_now: f64,
        clear_future: f64,
    ) -> Result<Projection, ForecastError> {
        match self {
            Self::Ratio(s) => s.project(actual, clear_now, clear_future),
            Self::Clipped(s) => s.project(actual, clear_now, clear_future),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Ratio(s) => s.name(),
            Self::Clipped(s) => s.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_scales_by_clear_sky_change() {
        let p = RatioProjection
            .project(500.0, 20_000.0, 21_000.0)
            .expect("non-degenerate");
        assert!((p.clear_sky_index - 0.025).abs() < 1e-15);
        assert!((p.prediction - 525.0).abs() < 1e-9);
        assert_eq!(p.clear_sky_future, 21_000.0);
    }

    #[test]
    fn ratio_rejects_zero_clear_sky() {
        let err = RatioProjection.project(5.0, 0.0, 10.0).unwrap_err();
        assert_eq!(err, ForecastError::DivisionDegenerate { clear_sky: 0.0 });

        let err = RatioProjection.project(5.0, 1e-13, 10.0).unwrap_err();
        assert_eq!(err.kind(), "division_degenerate");
    }

    #[test]
    fn ratio_rejects_negative_clear_sky() {
        // sun behind the panel: no sign flip, no forecast
        let err = RatioProjection.project(2.0, -4.0, 8.0).unwrap_err();
        assert_eq!(err, ForecastError::DivisionDegenerate { clear_sky: -4.0 });

        let err = RatioProjection.project(2.0, 1e-12, 8.0).unwrap_err();
        assert_eq!(err.kind(), "division_degenerate");
    }

    #[test]
    fn ratio_rejects_non_finite_ratio() {
        let err = RatioProjection.project(f64::MAX, 1e-11, 1.0).unwrap_err();
        assert_eq!(err.kind(), "division_degenerate");
    }

    #[test]
    fn clipped_floor_applies_exactly() {
        // actual below the floor
        let p = ClippedRelative.project(0.01, 0.5, 2.0).expect("never fails");
        assert_eq!(p.clear_sky_index, 0.05 / 0.5);

        // clear sky below the floor
        let p = ClippedRelative.project(0.04, 0.02, 2.0).expect("never fails");
        assert_eq!(p.clear_sky_index, 0.05 / 0.05);
        assert_eq!(p.prediction, 2.0);

        // exactly at the floor is left alone
        let p = ClippedRelative.project(0.05, 0.1, 1.0).expect("never fails");
        assert_eq!(p.clear_sky_index, 0.5);
    }

    #[test]
    fn clipped_ceiling_applies_exactly() {
        let p = ClippedRelative.project(3.0, 1.0, 4.0).expect("never fails");
        assert_eq!(p.clear_sky_index, 1.5);
        assert_eq!(p.prediction, 6.0);

        let p = ClippedRelative.project(1.5, 1.0, 4.0).expect("never fails");
        assert_eq!(p.clear_sky_index, 1.5);

        let p = ClippedRelative.project(1.2, 1.0, 4.0).expect("never fails");
        assert!((p.clear_sky_index - 1.2).abs() < 1e-15);
    }

    #[test]
    fn clipped_handles_night_without_error() {
        let p = ClippedRelative.project(0.0, 0.0, 0.0).expect("never fails");
        assert_eq!(p.clear_sky_index, 1.0);
        assert_eq!(p.prediction, 0.0);
    }

    #[test]
    fn strategy_kind_parses_and_defaults_units() {
        assert_eq!("ratio".parse::<StrategyKind>(), Ok(StrategyKind::Ratio));
        assert_eq!("clipped".parse::<StrategyKind>(), Ok(StrategyKind::Clipped));
        assert!("v1".parse::<StrategyKind>().is_err());
        assert_eq!(
            StrategyKind::Clipped.default_unit(),
            IrradianceUnit::KilowattsPerSquareMeter
        );
        assert_eq!(StrategyKind::Ratio.to_string(), "ratio");
    }

    #[test]
    fn strategy_enum_delegates() {
        let s = Strategy::from(StrategyKind::Clipped);
        assert_eq!(s.name(), "clipped");
        let p = s.project(3.0, 1.0, 1.0).expect("never fails");
        assert_eq!(p.clear_sky_index, 1.5);
        assert_eq!(Strategy::from(StrategyKind::Ratio).name(), "ratio");
    }
}
