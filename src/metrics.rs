//! Post-hoc forecast accuracy from a batch of sample forecasts.

use std::collections::BTreeMap;
use std::fmt;

use chrono::TimeDelta;
use serde::Serialize;

use crate::forecast::SampleForecast;

/// Accuracy of a batch, scored against observations inside the same batch.
///
/// A forecast made at `t` is scored against the sample measured at exactly
/// `t + Δt`. Samples with no such observation are counted as unmatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// Forecasts that had a matching observation.
    pub evaluated: usize,
    /// Samples whose forecast failed.
    pub failed: usize,
    /// Successful forecasts with no observation at `t + Δt`.
    pub unmatched: usize,
    /// Root-mean-square error.
    pub rmse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Mean of `forecast - observed`; positive means over-forecasting.
    pub mean_bias: f64,
    /// RMSE of naive persistence (`y(t)` as the forecast of `y(t + Δt)`)
    /// over the same evaluated samples.
    pub naive_rmse: f64,
    /// `1 - rmse / naive_rmse`; `None` when naive persistence is exact.
    pub skill: Option<f64>,
}

impl ForecastReport {
    /// Scores `forecasts` made with horizon `horizon`.
    ///
    /// # Arguments
    ///
    /// * `forecasts` - Output of one engine run
    /// * `horizon` - The horizon the forecasts were made for
    ///
    /// # Returns
    ///
    /// A `ForecastReport`; the error statistics are zero when nothing
    /// could be evaluated.
    pub fn evaluate(forecasts: &[SampleForecast], horizon: TimeDelta) -> Self {
        let observed: BTreeMap<_, f64> = forecasts
            .iter()
            .map(|f| (f.timestamp, f.actual_output))
            .collect();

        let mut evaluated = 0_usize;
        let mut failed = 0_usize;
        let mut unmatched = 0_usize;
        let mut sq_sum = 0.0_f64;
        let mut abs_sum = 0.0_f64;
        let mut bias_sum = 0.0_f64;
        let mut naive_sq_sum = 0.0_f64;

        for f in forecasts {
            let Some(prediction) = f.prediction() else {
                failed += 1;
                continue;
            };
            let Some(&actual) = observed.get(&(f.timestamp + horizon)) else {
                unmatched += 1;
                continue;
            };
            let err = prediction - actual;
            sq_sum += err * err;
            abs_sum += err.abs();
            bias_sum += err;
            let naive_err = f.actual_output - actual;
            naive_sq_sum += naive_err * naive_err;
            evaluated += 1;
        }

        if evaluated == 0 {
            return Self {
                evaluated,
                failed,
                unmatched,
                rmse: 0.0,
                mae: 0.0,
                mean_bias: 0.0,
                naive_rmse: 0.0,
                skill: None,
            };
        }

        let n = evaluated as f64;
        let rmse = (sq_sum / n).sqrt();
        let naive_rmse = (naive_sq_sum / n).sqrt();
        let skill = (naive_rmse > 0.0).then(|| 1.0 - rmse / naive_rmse);

        Self {
            evaluated,
            failed,
            unmatched,
            rmse,
            mae: abs_sum / n,
            mean_bias: bias_sum / n,
            naive_rmse,
            skill,
        }
    }
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Forecast Report ---")?;
        writeln!(f, "Samples evaluated:     {}", self.evaluated)?;
        writeln!(f, "Failed samples:        {}", self.failed)?;
        writeln!(f, "Unmatched samples:     {}", self.unmatched)?;
        writeln!(f, "RMSE:                  {:.4}", self.rmse)?;
        writeln!(f, "MAE:                   {:.4}", self.mae)?;
        writeln!(f, "Mean bias error:       {:.4}", self.mean_bias)?;
        writeln!(f, "Naive persistence RMSE: {:.4}", self.naive_rmse)?;
        match self.skill {
            Some(skill) => write!(f, "Forecast skill:        {:.1}%", skill * 100.0),
            None => write!(f, "Forecast skill:        n/a"),
        }
    }
}
