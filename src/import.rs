//! The forecast import pipeline.
//!
//! Ties the decoders, the merger, and the database together for one run: a
//! pair of forecast files goes in, an [`ImportReport`] comes out, and every
//! usable timestamp ends up persisted exactly once.

use std::path::Path;

use chrono::{NaiveDateTime, Timelike, Utc};

use crate::{
    db::{DateTable, WeatherDb},
    errors::ObsWxErr,
    forecast_file,
    record::{self, Atmosphere, WeatherRecord, WindSpeedCorrector},
    report::ImportReport,
};

/// One import run of a pair of forecast files.
pub struct ForecastImport<C> {
    forecast_time: NaiveDateTime,
    import_time: NaiveDateTime,
    corrector: C,
}

impl<C: WindSpeedCorrector> ForecastImport<C> {
    /// Set up a run for the forecast issued at `forecast_time` (UTC).
    ///
    /// The import time is captured now, seconds dropped, and recorded on
    /// every forecast row this run inserts.
    pub fn new(forecast_time: NaiveDateTime, corrector: C) -> Self {
        let now = Utc::now().naive_utc();
        let import_time = now.date().and_hms(now.hour(), now.minute(), 0);

        ForecastImport {
            forecast_time,
            import_time,
            corrector,
        }
    }

    /// Replace the captured import time, e.g. when replaying old files.
    pub fn with_import_time(mut self, import_time: NaiveDateTime) -> Self {
        self.import_time = import_time;
        self
    }

    /// Parse both files and merge them into per-timestamp records.
    ///
    /// A header mismatch in either file aborts the run before anything is
    /// persisted.
    pub fn read(
        &self,
        ground_path: &Path,
        atmo_path: &Path,
        report: &mut ImportReport,
    ) -> Result<Vec<(NaiveDateTime, WeatherRecord)>, ObsWxErr> {
        report.line(format!("Reading ground file: {}", ground_path.display()));
        let ground = forecast_file::load_ground(ground_path)?;

        report.line(format!("Reading atmosphere file: {}", atmo_path.display()));
        let atmo = forecast_file::load_atmosphere(atmo_path)?;

        Ok(record::merge(
            ground,
            atmo,
            self.forecast_time,
            &self.corrector,
            report,
        ))
    }

    /// Persist merged records.
    ///
    /// Records without the full set of frequency vectors, or without a
    /// forecast horizon, are reported and skipped. A row the store hands
    /// back in an unexpected shape is reported and skipped too; any other
    /// database error aborts the run.
    pub fn insert(
        &self,
        db: &WeatherDb,
        data: &[(NaiveDateTime, WeatherRecord)],
        report: &mut ImportReport,
    ) -> Result<(), ObsWxErr> {
        report.line(format!("Inserting data for forecast {}", self.forecast_time));

        let forecast_time_id = db.date_id(DateTable::ForecastTimes, self.forecast_time)?;
        let import_time_id = db.date_id(DateTable::ImportTimes, self.import_time)?;

        for (timestamp, value) in data {
            let atmosphere = match &value.atmosphere {
                Some(atmosphere) => atmosphere,
                None => {
                    report.line(format!(
                        "ERROR: Got wind but not atmosphere forecasts for {}",
                        timestamp
                    ));
                    report.count_skipped();
                    continue;
                }
            };

            let forecast_type_id = match value.forecast_type_id {
                Some(id) => id,
                None => {
                    report.line(format!("ERROR: No forecast horizon for {}", timestamp));
                    report.count_skipped();
                    continue;
                }
            };

            report.progress(&format!(
                "{} UT: Inserting weather for {}",
                Utc::now().format("%H:%M:%S"),
                timestamp
            ));

            let inserted = self.insert_one(
                db,
                *timestamp,
                forecast_type_id,
                forecast_time_id,
                import_time_id,
                value,
                atmosphere,
            );

            match inserted {
                Ok(()) => report.count_inserted(),
                Err(ObsWxErr::DataIntegrity(msg)) => {
                    report.line(format!("ERROR: Skipping {}: {}", timestamp, msg));
                    report.count_skipped();
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_one(
        &self,
        db: &WeatherDb,
        timestamp: NaiveDateTime,
        forecast_type_id: i32,
        forecast_time_id: i64,
        import_time_id: i64,
        value: &WeatherRecord,
        atmosphere: &Atmosphere,
    ) -> Result<(), ObsWxErr> {
        let weather_date_id = db.date_id(DateTable::WeatherDates, timestamp)?;

        let forecast_id = db.add_forecast(
            forecast_type_id,
            weather_date_id,
            forecast_time_id,
            import_time_id,
            value,
        )?;

        db.add_forecast_by_frequency(forecast_id, atmosphere)
    }

    /// Run the whole pipeline: parse, merge, classify, persist.
    pub fn run(
        &self,
        db: &WeatherDb,
        ground_path: &Path,
        atmo_path: &Path,
        quiet: bool,
    ) -> Result<ImportReport, ObsWxErr> {
        let mut report = ImportReport::new(quiet);
        report.line(format!("Performing import at {} UTC", Utc::now().naive_utc()));

        let data = self.read(ground_path, atmo_path, &mut report)?;
        self.insert(db, &data, &mut report)?;

        Ok(report)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use crate::db::unit::*; // test helpers.
    use crate::forecast_file::unit::{atmo_fixture, ground_fixture}; // fixture builders.
    use crate::record::NoCorrection;

    use std::fs;

    use chrono::NaiveDate;

    // MJD 51544.0 is 2000-01-01T00:00:00 UTC.
    const FIXTURE_MJD: f64 = 51544.0;

    fn fixture_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd(2000, 1, 1).and_hms(0, 0, 0)
    }

    fn write_fixtures(
        dir: &Path,
        ground_mjd: f64,
        atmo_mjd: f64,
    ) -> (std::path::PathBuf, std::path::PathBuf) {
        let ground_path = dir.join("time_avrg.txt");
        let atmo_path = dir.join("time_hotsprings.txt");

        fs::write(&ground_path, ground_fixture(ground_mjd, 44.74)).unwrap();
        fs::write(&atmo_path, atmo_fixture(atmo_mjd)).unwrap();

        (ground_path, atmo_path)
    }

    #[test]
    fn test_import_end_to_end() {
        let TestDb { tmp, db } = create_test_db().expect("Failed to create test db.");
        let (ground_path, atmo_path) = write_fixtures(tmp.path(), FIXTURE_MJD, FIXTURE_MJD);

        let import = ForecastImport::new(fixture_timestamp(), NoCorrection)
            .with_import_time(NaiveDate::from_ymd(2000, 1, 1).and_hms(1, 23, 0));

        let report = import
            .run(&db, &ground_path, &atmo_path, true)
            .expect("Import failed.");

        assert_eq!(report.num_inserted(), 1);
        assert_eq!(report.num_skipped(), 0);

        // Exactly one forecast row, with both wind speeds.
        assert_eq!(db.count_rows("forecasts").unwrap(), 1);
        let date_id = db
            .date_id(DateTable::WeatherDates, fixture_timestamp())
            .unwrap();
        let (mps, mph) = db.forecast_speeds(9, date_id).unwrap();
        assert!((mph - 44.74).abs() < 1e-9);
        assert!((mps - 44.74 / 2.237).abs() < 1e-9);
        assert!((mps - 20.0).abs() < 1e-3);

        // One per-frequency row for each of the 50 frequencies.
        assert_eq!(
            db.count_rows("forecast_by_frequency").unwrap(),
            crate::forecast_file::NUM_ATMO_FREQS as i64
        );

        // One row each for the run's bookkeeping tables.
        assert_eq!(db.count_rows("forecast_times").unwrap(), 1);
        assert_eq!(db.count_rows("import_times").unwrap(), 1);
    }

    #[test]
    fn test_import_is_idempotent() {
        let TestDb { tmp, db } = create_test_db().expect("Failed to create test db.");
        let (ground_path, atmo_path) = write_fixtures(tmp.path(), FIXTURE_MJD, FIXTURE_MJD);

        let import = ForecastImport::new(fixture_timestamp(), NoCorrection)
            .with_import_time(NaiveDate::from_ymd(2000, 1, 1).and_hms(1, 23, 0));

        import
            .run(&db, &ground_path, &atmo_path, true)
            .expect("First import failed.");
        import
            .run(&db, &ground_path, &atmo_path, true)
            .expect("Second import failed.");

        assert_eq!(db.count_rows("forecasts").unwrap(), 1);
        assert_eq!(
            db.count_rows("forecast_by_frequency").unwrap(),
            crate::forecast_file::NUM_ATMO_FREQS as i64
        );
        assert_eq!(db.count_rows("weather_dates").unwrap(), 1);
    }

    #[test]
    fn test_partial_records_are_never_persisted() {
        let TestDb { tmp, db } = create_test_db().expect("Failed to create test db.");

        // The atmosphere file has a different hour than the ground file, so
        // the ground hour has no frequency vectors and the atmosphere hour
        // has no companion wind data.
        let (ground_path, atmo_path) = write_fixtures(tmp.path(), FIXTURE_MJD, FIXTURE_MJD + 0.5);

        let import = ForecastImport::new(fixture_timestamp(), NoCorrection)
            .with_import_time(NaiveDate::from_ymd(2000, 1, 1).and_hms(1, 23, 0));

        let report = import
            .run(&db, &ground_path, &atmo_path, true)
            .expect("Import failed.");

        assert_eq!(report.num_inserted(), 0);
        assert_eq!(report.num_skipped(), 1);
        assert!(report
            .lines()
            .iter()
            .any(|line| line.contains("No wind data")));
        assert!(report
            .lines()
            .iter()
            .any(|line| line.contains("Got wind but not atmosphere")));

        assert_eq!(db.count_rows("forecasts").unwrap(), 0);
        assert_eq!(db.count_rows("forecast_by_frequency").unwrap(), 0);
    }

    #[test]
    fn test_unknown_horizon_is_skipped() {
        let TestDb { tmp, db } = create_test_db().expect("Failed to create test db.");
        let (ground_path, atmo_path) = write_fixtures(tmp.path(), FIXTURE_MJD, FIXTURE_MJD);

        // Observation is 10 days past the forecast time, far beyond the
        // largest representable lead time.
        let forecast_time = NaiveDate::from_ymd(1999, 12, 22).and_hms(0, 0, 0);
        let import = ForecastImport::new(forecast_time, NoCorrection)
            .with_import_time(NaiveDate::from_ymd(2000, 1, 1).and_hms(1, 23, 0));

        let report = import
            .run(&db, &ground_path, &atmo_path, true)
            .expect("Import failed.");

        assert_eq!(report.num_inserted(), 0);
        assert_eq!(report.num_skipped(), 1);
        assert!(report
            .lines()
            .iter()
            .any(|line| line.contains("No forecast horizon")));
        assert_eq!(db.count_rows("forecasts").unwrap(), 0);
    }

    #[test]
    fn test_bad_header_aborts_the_run() {
        let TestDb { tmp, db } = create_test_db().expect("Failed to create test db.");

        let ground_path = tmp.path().join("time_avrg.txt");
        let atmo_path = tmp.path().join("time_hotsprings.txt");
        fs::write(&ground_path, "not a header\n51544.0 44.74\n").unwrap();
        fs::write(&atmo_path, atmo_fixture(FIXTURE_MJD)).unwrap();

        let import = ForecastImport::new(fixture_timestamp(), NoCorrection);

        match import.run(&db, &ground_path, &atmo_path, true) {
            Err(ObsWxErr::HeaderMismatch { .. }) => {}
            Err(err) => panic!("Wrong error type returned: {}", err),
            Ok(_) => panic!("A bad header must abort the run."),
        }

        assert_eq!(db.count_rows("forecasts").unwrap(), 0);
    }
}
