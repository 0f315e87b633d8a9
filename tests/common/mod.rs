//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use pv_persistence::forecast::{ForecastConfig, SmartPersistence};
use pv_persistence::solar::time::attach_civil_offset;

/// Reference meridian of the Stanford clock (Pacific time).
pub const PACIFIC_MERIDIAN: f64 = -120.0;

/// Wall-clock reading without an offset.
pub fn wall_clock(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(hh, mm, ss))
        .expect("valid test timestamp")
}

/// Pacific civil time (PST or PDT by the daylight saving window).
pub fn pacific(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> DateTime<FixedOffset> {
    attach_civil_offset(wall_clock(y, m, d, hh, mm, 0), PACIFIC_MERIDIAN)
}

/// Engine for the default Stanford configuration (SPA, ratio, W/m²).
pub fn stanford_engine() -> SmartPersistence {
    SmartPersistence::from_config(&ForecastConfig::default()).expect("default config is valid")
}

/// Engine for the geometric Stanford configuration (clipped, kW/m²).
pub fn geometric_engine() -> SmartPersistence {
    SmartPersistence::from_config(&ForecastConfig::stanford_geometric())
        .expect("geometric preset is valid")
}

/// Relative difference of `a` from `b`.
pub fn relative_diff(a: f64, b: f64) -> f64 {
    ((a - b) / b).abs()
}
