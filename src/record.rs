//! Merged per-timestamp weather records.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::{
    forecast_file::{self, AtmoRow, GroundRow},
    horizon,
    report::ImportReport,
};

/// Miles per hour in one meter per second, as defined by the consuming
/// database. Changing this changes persisted values.
pub const MPH_PER_MPS: f64 = 2.237;

/// Convert a wind speed from miles per hour to meters per second.
pub fn mph_to_mps(speed_mph: f64) -> f64 {
    speed_mph / MPH_PER_MPS
}

/// Corrects raw forecast wind speeds for known sensor bias.
///
/// The bias model lives outside this crate; implementations are handed the
/// observation hour and the uncorrected speed in m/s.
pub trait WindSpeedCorrector {
    /// Return the corrected speed in m/s.
    fn correct(&self, timestamp: NaiveDateTime, speed_mps: f64) -> f64;
}

/// A pass-through corrector for contexts with no bias model available.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCorrection;

impl WindSpeedCorrector for NoCorrection {
    fn correct(&self, _timestamp: NaiveDateTime, speed_mps: f64) -> f64 {
        speed_mps
    }
}

/// The frequency-indexed part of a forecast, all vectors index-aligned.
///
/// A row of the atmosphere file always carries all three quantities, so a
/// record either has the whole set or none of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Atmosphere {
    /// The frequencies, in GHz, the remaining vectors are calculated at.
    pub freqs: Vec<i32>,
    /// Zenith opacity per frequency.
    pub opacity: Vec<f64>,
    /// System temperature per frequency, in K.
    pub tsys: Vec<f64>,
    /// Atmospheric kinetic temperature per frequency, in K.
    pub tatm: Vec<f64>,
}

/// Everything known about one observation hour after merging both files.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherRecord {
    /// The forecast-horizon bucket, if the lead time has one.
    pub forecast_type_id: Option<i32>,
    /// Forecast wind speed in miles per hour, as read from the ground file.
    pub speed_mph: f64,
    /// Forecast wind speed in m/s after unit conversion and bias correction.
    pub speed_mps: f64,
    /// The frequency-indexed forecast, when the atmosphere file had this hour.
    pub atmosphere: Option<Atmosphere>,
}

/// Merge decoder outputs into one record per timestamp, ascending.
///
/// Ground rows seed the records and are classified against `forecast_time`.
/// An atmosphere row with no companion ground row is reported and dropped;
/// the rest of the batch continues.
pub fn merge<C: WindSpeedCorrector>(
    ground: Vec<GroundRow>,
    atmo: Vec<AtmoRow>,
    forecast_time: NaiveDateTime,
    corrector: &C,
    report: &mut ImportReport,
) -> Vec<(NaiveDateTime, WeatherRecord)> {
    let mut data: BTreeMap<NaiveDateTime, WeatherRecord> = BTreeMap::new();

    for row in ground {
        let speed_mph = row.values[forecast_file::SPEED_MPH];
        let speed_mps = corrector.correct(row.timestamp, mph_to_mps(speed_mph));

        data.insert(
            row.timestamp,
            WeatherRecord {
                forecast_type_id: horizon::for_timestamp(row.timestamp, forecast_time),
                speed_mph,
                speed_mps,
                atmosphere: None,
            },
        );
    }

    for row in atmo {
        match data.get_mut(&row.timestamp) {
            Some(record) => record.atmosphere = Some(row.atmosphere),
            None => report.line(format!("ERROR: No wind data for {}", row.timestamp)),
        }
    }

    data.into_iter().collect()
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
