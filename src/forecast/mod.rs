//! Smart-persistence forecasting.
//!
//! The output at `t` is divided by the clear-sky power at `t`, and the
//! resulting clear-sky index is assumed to persist to `t + Δt`.

pub mod engine;
pub mod strategy;
pub mod types;

pub use engine::{ForecastConfig, SmartPersistence, forecast};
pub use strategy::{ClippedRelative, ForecastStrategy, RatioProjection, Strategy, StrategyKind};
pub use types::{Projection, Sample, SampleForecast};
