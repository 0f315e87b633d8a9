//! Civil clock time to true local solar time.
//!
//! Timestamps are read as wall-clock time on a reference meridian (for the
//! default site, -120° i.e. Pacific standard time). The correction shifts them
//! to the panel's own meridian and then applies a North-American daylight
//! saving heuristic: inside the window from the second Sunday of March to the
//! first Sunday of November the clock is assumed to run one hour ahead.
//!
//! The heuristic is approximate. It keys on the day of year only, so the hour
//! between the transition instant and midnight on the transition days is not
//! corrected. For offset-aware timestamps [`civil_wall_clock`] decides the
//! daylight hour on the standard-time date while [`localize`] decides it after
//! the longitude correction; on the first Sunday of November an instant less
//! than the correction past standard-time midnight therefore reads one hour
//! early. No single date can key both steps: the solar time just before
//! midnight on the last daylight day is unreachable from a wall-clock reading.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, Timelike, Utc,
    Weekday,
};

const SECONDS_PER_HOUR: i64 = 3600;

/// Days per month in a common year.
const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// True local solar time of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarTime {
    /// Day of year, 1-based.
    pub day_of_year: u32,
    /// Seconds since local solar midnight, in [0, 86400).
    pub seconds_of_day: u32,
}

/// Offset between the reference meridian's clock and the panel's solar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongitudeCorrection {
    /// Whole minutes of the correction.
    pub minutes: u32,
    /// Residual whole seconds (truncated).
    pub seconds: u32,
}

impl LongitudeCorrection {
    /// Correction for a panel at `longitude` whose clock follows
    /// `reference_longitude`: four minutes per degree, taken as a magnitude.
    pub fn between(longitude: f64, reference_longitude: f64) -> Self {
        let total_minutes = (60.0 / 15.0 * (longitude - reference_longitude)).abs();
        let minutes = total_minutes.trunc();
        let seconds = ((total_minutes - minutes) * 60.0).trunc();
        Self {
            minutes: minutes as u32,
            seconds: seconds as u32,
        }
    }

    fn as_delta(self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.minutes) * 60 + i64::from(self.seconds))
    }
}

/// Whether `year` has a 29th of February.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// 1-based day of year from the month-length table.
pub fn day_of_year(date: NaiveDate) -> u32 {
    let month_index = date.month0() as usize;
    let mut days: u32 = MONTH_DAYS[..month_index].iter().sum();
    if month_index > 1 && is_leap_year(date.year()) {
        days += 1;
    }
    days + date.day()
}

/// Date of the `nth` Sunday of `month`, counted from the month's first week.
fn nth_sunday(year: i32, month: u32, nth: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, nth)
}

/// Day-of-year bounds `[start, end)` of daylight saving time in `year`:
/// the second Sunday of March and the first Sunday of November.
///
/// Returns `None` only for years outside chrono's calendar range.
pub fn dst_window(year: i32) -> Option<(u32, u32)> {
    let start = nth_sunday(year, 3, 2)?;
    let end = nth_sunday(year, 11, 1)?;
    Some((day_of_year(start), day_of_year(end)))
}

fn in_dst_window(date: NaiveDate) -> bool {
    dst_window(date.year()).is_some_and(|(start, end)| (start..end).contains(&day_of_year(date)))
}

/// Standard-time offset of the reference meridian, rounded to whole hours
/// (-120° gives UTC-08:00).
pub fn standard_offset(reference_longitude: f64) -> FixedOffset {
    let seconds = (reference_longitude / 15.0).round() as i32 * SECONDS_PER_HOUR as i32;
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

/// Gives a timezone-naive wall-clock timestamp on the reference meridian its
/// UTC offset: standard time, plus one hour inside the daylight saving window.
pub fn attach_civil_offset(
    wall_clock: NaiveDateTime,
    reference_longitude: f64,
) -> DateTime<FixedOffset> {
    let standard = standard_offset(reference_longitude);
    let offset = if in_dst_window(wall_clock.date()) {
        FixedOffset::east_opt(standard.local_minus_utc() + SECONDS_PER_HOUR as i32)
            .unwrap_or(standard)
    } else {
        standard
    };
    let utc = wall_clock - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

/// Wall-clock reading of `timestamp` on the reference meridian, the inverse
/// of [`attach_civil_offset`] away from the daylight saving transitions.
///
/// The daylight hour is added when the standard-time date lies in the
/// window. Fed through [`localize`], this is exact except just after
/// standard-time midnight on the first Sunday of November (see the module
/// notes).
pub fn civil_wall_clock(
    timestamp: &DateTime<FixedOffset>,
    reference_longitude: f64,
) -> NaiveDateTime {
    let standard = timestamp
        .with_timezone(&standard_offset(reference_longitude))
        .naive_local();
    if in_dst_window(standard.date()) {
        standard + TimeDelta::seconds(SECONDS_PER_HOUR)
    } else {
        standard
    }
}

/// Converts a civil timestamp on the reference meridian into true local
/// solar time at `longitude`.
///
/// The longitude correction is subtracted from the clock time (borrowing from
/// the hour, and from the previous day when it crosses midnight). Inside the
/// daylight saving window a further hour is removed.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pv_persistence::solar::time::localize;
///
/// let clock = NaiveDate::from_ymd_opt(2024, 1, 15)
///     .unwrap()
///     .and_hms_opt(12, 8, 40)
///     .unwrap();
/// let solar = localize(clock, -122.17023, -120.0);
/// assert_eq!(solar.day_of_year, 15);
/// assert_eq!(solar.seconds_of_day, 12 * 3600);
/// ```
pub fn localize(
    timestamp: NaiveDateTime,
    longitude: f64,
    reference_longitude: f64,
) -> SolarTime {
    let correction = LongitudeCorrection::between(longitude, reference_longitude);
    let mut local = timestamp - correction.as_delta();

    if in_dst_window(local.date()) {
        local -= TimeDelta::seconds(SECONDS_PER_HOUR);
    }

    SolarTime {
        day_of_year: day_of_year(local.date()),
        seconds_of_day: local.num_seconds_from_midnight(),
    }
}
