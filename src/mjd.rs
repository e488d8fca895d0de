//! Conversions between Modified Julian Date and hourly UTC timestamps.
//!
//! The forecast producer keys every data row by a Modified Julian Date, a
//! continuous day count from 1858-11-17T00:00:00 UTC. All timestamps in the
//! scheduling database are UTC and truncated to the whole hour, so the
//! conversion here is the join key for everything downstream.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// The calendar origin of the Modified Julian Date, 1858-11-17T00:00:00 UTC.
pub fn mjd_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd(1858, 11, 17).and_hms(0, 0, 0)
}

/// Convert a Modified Julian Date to a UTC timestamp.
///
/// Rounded to the nearest millisecond so two runs converting the same float
/// always produce the same instant.
pub fn to_datetime(mjd: f64) -> NaiveDateTime {
    mjd_epoch() + Duration::milliseconds((mjd * MILLIS_PER_DAY).round() as i64)
}

/// Convert a Modified Julian Date to a UTC timestamp truncated to the hour.
///
/// Observations falling within the same clock hour collapse to the same key.
pub fn to_hour(mjd: f64) -> NaiveDateTime {
    truncate_to_hour(to_datetime(mjd))
}

/// Zero out the minutes, seconds, and sub-second part of a timestamp.
pub fn truncate_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_hms(t.hour(), 0, 0)
}

/// Whole hours from `origin` to `t`, rounded to the nearest hour.
///
/// Negative when `t` precedes `origin`.
pub fn hour_offset(t: NaiveDateTime, origin: NaiveDateTime) -> i64 {
    let secs = (t - origin).num_seconds();
    (secs as f64 / 3600.0).round() as i64
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
