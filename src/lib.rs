//! Smart-persistence PV output forecasting.
//!
//! The clear-sky index measured at `t` is assumed to persist to `t + Δt`,
//! and the forecast is that index times the clear-sky power at `t + Δt`.

/// REST API over the forecast engine.
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
pub mod forecast;
pub mod io;
pub mod irradiance;
pub mod metrics;
/// Sun position back-ends and solar time.
pub mod solar;
pub mod synthetic;

pub use config::{ConfigError, RunConfig};
pub use error::ForecastError;
pub use forecast::{ForecastConfig, Sample, SampleForecast, SmartPersistence, forecast};
