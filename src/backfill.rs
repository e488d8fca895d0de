//! Repair missing values in persisted weather rows from sampled data.
//!
//! The telescope site records its own hourly samples outside this crate.
//! The routines here find persisted rows with holes, ask a sampled-data
//! source for the matching hour, and patch exactly what was missing. A
//! source miss skips that row, never the batch.

use std::{collections::HashMap, fs, path::Path};

use chrono::{Duration, NaiveDateTime};

use crate::{
    db::{GbtWeatherColumn, WeatherDb},
    errors::ObsWxErr,
    mjd,
};

/// Hourly median samples recorded at the telescope site.
///
/// `None` means the source has no data for that hour. Implementations must
/// not encode a missing sample as NaN; one that leaks through is discarded
/// before any write.
pub trait SampledSource {
    /// Median wind speed for the hour containing `t`, in m/s.
    fn hour_median_wind_speed(&self, t: NaiveDateTime) -> Option<f64>;

    /// Median downward irradiance for the hour containing `t`, in W/m^2.
    fn hour_median_irradiance(&self, t: NaiveDateTime) -> Option<f64>;
}

/// Hourly median samples loaded from an MJD-keyed text file.
///
/// Each row is `MJD wind-speed irradiance`, whitespace separated, one hour
/// per row. The sampler encodes an hour it has no data for as NaN; that
/// value never leaves this type, it surfaces as `None`.
#[derive(Debug, Default)]
pub struct FileSamples {
    wind: HashMap<NaiveDateTime, f64>,
    irradiance: HashMap<NaiveDateTime, f64>,
}

impl FileSamples {
    /// Read and decode a sample file.
    pub fn load(path: &Path) -> Result<Self, ObsWxErr> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Decode the text of a sample file.
    pub fn parse(text: &str) -> Result<Self, ObsWxErr> {
        let mut samples = FileSamples::default();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(ObsWxErr::BadRow(format!(
                    "expected 3 columns, found {} in: {}",
                    fields.len(),
                    line
                )));
            }

            let timestamp = mjd::to_hour(fields[0].parse()?);
            let wind: f64 = fields[1].parse()?;
            let irradiance: f64 = fields[2].parse()?;

            if !wind.is_nan() {
                samples.wind.insert(timestamp, wind);
            }
            if !irradiance.is_nan() {
                samples.irradiance.insert(timestamp, irradiance);
            }
        }

        Ok(samples)
    }
}

impl SampledSource for FileSamples {
    fn hour_median_wind_speed(&self, t: NaiveDateTime) -> Option<f64> {
        self.wind.get(&t).copied()
    }

    fn hour_median_irradiance(&self, t: NaiveDateTime) -> Option<f64> {
        self.irradiance.get(&t).copied()
    }
}

/// One row repaired by a backfill pass.
#[derive(Clone, Debug, PartialEq)]
pub struct BackfillRecord {
    /// The gbt_weather row id that was patched.
    pub row_id: i64,
    /// The hour the row describes.
    pub timestamp: NaiveDateTime,
    /// The value written, or that would be written in a dry run.
    pub value: f64,
}

/// Fill NULL cells of `column` from `resolver`.
///
/// Rows the resolver cannot answer for are skipped. With `dry_run` set the
/// returned records describe what would change but nothing is written. Do
/// not run two backfills over the same column and range concurrently; the
/// updates are unconditional.
pub fn backfill<F>(
    db: &WeatherDb,
    column: GbtWeatherColumn,
    resolver: F,
    range: Option<(NaiveDateTime, NaiveDateTime)>,
    dry_run: bool,
) -> Result<Vec<BackfillRecord>, ObsWxErr>
where
    F: Fn(NaiveDateTime) -> Option<f64>,
{
    let mut results = Vec::new();

    for (row_id, timestamp) in db.null_value_rows(column, range)? {
        let value = match resolver(timestamp) {
            Some(value) if !value.is_nan() => value,
            _ => continue,
        };

        if !dry_run {
            db.update_gbt_weather(row_id, column, value)?;
        }

        results.push(BackfillRecord {
            row_id,
            timestamp,
            value,
        });
    }

    Ok(results)
}

/// Backfill the measured wind speed column from `source`.
pub fn backfill_wind<S: SampledSource>(
    db: &WeatherDb,
    source: &S,
    dry_run: bool,
) -> Result<Vec<BackfillRecord>, ObsWxErr> {
    backfill(
        db,
        GbtWeatherColumn::WindSpeed,
        |t| source.hour_median_wind_speed(t),
        None,
        dry_run,
    )
}

/// Backfill the irradiance column from `source`.
pub fn backfill_irradiance<S: SampledSource>(
    db: &WeatherDb,
    source: &S,
    dry_run: bool,
) -> Result<Vec<BackfillRecord>, ObsWxErr> {
    backfill(
        db,
        GbtWeatherColumn::Irradiance,
        |t| source.hour_median_irradiance(t),
        None,
        dry_run,
    )
}

/// Insert measured-weather rows for dates in the year before `end` that have
/// none.
///
/// A date the source has no wind sample for is skipped entirely; a date with
/// wind but no irradiance gets a wind-only row. Returns what was inserted.
pub fn update_weather<S: SampledSource>(
    db: &WeatherDb,
    source: &S,
    end: NaiveDateTime,
) -> Result<Vec<(i64, f64, Option<f64>)>, ObsWxErr> {
    let start = end - Duration::days(365);

    let mut results = Vec::new();
    for (date_id, date) in db.missing_weather_dates(start, end)? {
        let wind = match source.hour_median_wind_speed(date) {
            Some(value) if !value.is_nan() => value,
            _ => continue,
        };
        let irradiance = source
            .hour_median_irradiance(date)
            .filter(|value| !value.is_nan());

        db.add_gbt_weather(date_id, Some(wind), irradiance)?;
        results.push((date_id, wind, irradiance));
    }

    Ok(results)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::db::unit::*; // test helpers.
    use crate::db::DateTable;

    use std::collections::HashMap;

    use chrono::NaiveDate;

    #[derive(Default)]
    struct TestSamples {
        wind: HashMap<NaiveDateTime, f64>,
        irradiance: HashMap<NaiveDateTime, f64>,
    }

    impl SampledSource for TestSamples {
        fn hour_median_wind_speed(&self, t: NaiveDateTime) -> Option<f64> {
            self.wind.get(&t).copied()
        }

        fn hour_median_irradiance(&self, t: NaiveDateTime) -> Option<f64> {
            self.irradiance.get(&t).copied()
        }
    }

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd(2009, 5, 4).and_hms(h, 0, 0)
    }

    #[test]
    fn test_backfill_patches_only_missing_cells() {
        let TestDb { tmp: _tmp, db } = create_test_db().expect("Failed to create test db.");

        let id0 = db.date_id(DateTable::WeatherDates, hour(0)).unwrap();
        let id1 = db.date_id(DateTable::WeatherDates, hour(1)).unwrap();
        db.add_gbt_weather(id0, Some(5.0), None).unwrap();
        db.add_gbt_weather(id1, Some(6.0), Some(310.0)).unwrap();

        let mut source = TestSamples::default();
        source.irradiance.insert(hour(0), 290.0);
        source.irradiance.insert(hour(1), 999.0); // must not overwrite

        let results = backfill_irradiance(&db, &source, false).expect("Error backfilling.");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].timestamp, hour(0));
        assert_eq!(results[0].value, 290.0);

        let row = db.gbt_weather_row(results[0].row_id).unwrap();
        assert_eq!(row, (Some(5.0), Some(290.0)));
    }

    #[test]
    fn test_backfill_skips_source_misses_and_nan() {
        let TestDb { tmp: _tmp, db } = create_test_db().expect("Failed to create test db.");

        let id0 = db.date_id(DateTable::WeatherDates, hour(0)).unwrap();
        let id1 = db.date_id(DateTable::WeatherDates, hour(1)).unwrap();
        db.add_gbt_weather(id0, None, Some(300.0)).unwrap();
        db.add_gbt_weather(id1, None, Some(301.0)).unwrap();

        let mut source = TestSamples::default();
        // No sample at all for hour 0, a NaN for hour 1.
        source.wind.insert(hour(1), std::f64::NAN);

        let results = backfill_wind(&db, &source, false).expect("Error backfilling.");
        assert!(results.is_empty());

        // Both rows still need wind.
        assert_eq!(
            db.null_value_rows(GbtWeatherColumn::WindSpeed, None)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_backfill_dry_run_writes_nothing() {
        let TestDb { tmp: _tmp, db } = create_test_db().expect("Failed to create test db.");

        let id0 = db.date_id(DateTable::WeatherDates, hour(0)).unwrap();
        db.add_gbt_weather(id0, Some(5.0), None).unwrap();

        let mut source = TestSamples::default();
        source.irradiance.insert(hour(0), 290.0);

        let results = backfill_irradiance(&db, &source, true).expect("Error backfilling.");

        assert_eq!(results.len(), 1);
        assert_eq!(
            db.null_value_rows(GbtWeatherColumn::Irradiance, None)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_backfill_respects_the_date_range() {
        let TestDb { tmp: _tmp, db } = create_test_db().expect("Failed to create test db.");

        let id0 = db.date_id(DateTable::WeatherDates, hour(0)).unwrap();
        let id1 = db.date_id(DateTable::WeatherDates, hour(6)).unwrap();
        db.add_gbt_weather(id0, Some(5.0), None).unwrap();
        db.add_gbt_weather(id1, Some(6.0), None).unwrap();

        let results = backfill(
            &db,
            GbtWeatherColumn::Irradiance,
            |_| Some(290.0),
            Some((hour(0), hour(6))),
            false,
        )
        .expect("Error backfilling.");

        // The half-open range excludes the row at hour 6.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].timestamp, hour(0));
    }

    #[test]
    fn test_file_samples_treat_nan_as_missing() {
        // MJD 54955.0 is 2009-05-04T00:00:00 UTC, 54955.5 is noon.
        let text = "54955.0 NaN 305.0\n54955.5 5.5 310.0\n";
        let samples = FileSamples::parse(text).expect("Error parsing samples.");

        assert_eq!(samples.hour_median_wind_speed(hour(0)), None);
        assert_eq!(samples.hour_median_irradiance(hour(0)), Some(305.0));
        assert_eq!(samples.hour_median_wind_speed(hour(12)), Some(5.5));
        assert_eq!(samples.hour_median_irradiance(hour(12)), Some(310.0));

        // No row at all for this hour.
        assert_eq!(samples.hour_median_wind_speed(hour(1)), None);
    }

    #[test]
    fn test_file_samples_reject_short_rows() {
        match FileSamples::parse("54955.0 5.5\n") {
            Err(ObsWxErr::BadRow(_)) => {}
            Err(err) => panic!("Wrong error type returned: {}", err),
            Ok(_) => panic!("A short row must not parse."),
        }
    }

    #[test]
    fn test_file_samples_drive_a_backfill() {
        let TestDb { tmp: _tmp, db } = create_test_db().expect("Failed to create test db.");

        let id0 = db.date_id(DateTable::WeatherDates, hour(0)).unwrap();
        db.add_gbt_weather(id0, Some(5.0), None).unwrap();

        let samples = FileSamples::parse("54955.0 NaN 305.0\n").expect("Error parsing samples.");
        let results = backfill_irradiance(&db, &samples, false).expect("Error backfilling.");

        assert_eq!(results.len(), 1);
        assert_eq!(
            db.gbt_weather_row(results[0].row_id).unwrap(),
            (Some(5.0), Some(305.0))
        );
    }

    #[test]
    fn test_update_weather_inserts_what_the_source_has() {
        let TestDb { tmp: _tmp, db } = create_test_db().expect("Failed to create test db.");

        db.date_id(DateTable::WeatherDates, hour(0)).unwrap();
        db.date_id(DateTable::WeatherDates, hour(1)).unwrap();
        db.date_id(DateTable::WeatherDates, hour(2)).unwrap();

        let mut source = TestSamples::default();
        source.wind.insert(hour(0), 4.0);
        source.irradiance.insert(hour(0), 320.0);
        source.wind.insert(hour(1), 5.0); // no irradiance for hour 1
        source.irradiance.insert(hour(2), 330.0); // no wind for hour 2

        let end = NaiveDate::from_ymd(2009, 5, 5).and_hms(0, 0, 0);
        let results = update_weather(&db, &source, end).expect("Error updating.");

        // Hour 2 was skipped entirely for want of wind data.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, 4.0);
        assert_eq!(results[0].2, Some(320.0));
        assert_eq!(results[1].1, 5.0);
        assert_eq!(results[1].2, None);
        assert_eq!(db.count_rows("gbt_weather").unwrap(), 2);

        // A second pass inserts nothing: hour 2 is still missing wind data
        // and the other hours are covered now.
        let results = update_weather(&db, &source, end).expect("Error updating.");
        assert!(results.is_empty());
        assert_eq!(db.count_rows("gbt_weather").unwrap(), 2);
    }
}
