use chrono::NaiveDateTime;
use rusqlite::types::ToSql;
use strum::AsStaticRef;
use strum_macros::{AsStaticStr, EnumString};

use super::WeatherDb;

use crate::{
    errors::ObsWxErr,
    record::{Atmosphere, WeatherRecord},
};

/// The tables whose rows are uniquely identified by a date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsStaticStr)]
pub enum DateTable {
    /// When each forecast run was issued.
    #[strum(to_string = "forecast_times")]
    ForecastTimes,
    /// When each import run happened.
    #[strum(to_string = "import_times")]
    ImportTimes,
    /// The observation hours forecasts and measurements hang off of.
    #[strum(to_string = "weather_dates")]
    WeatherDates,
}

impl WeatherDb {
    /// Find the row for `date` in the given table, creating it on a miss, and
    /// return its id.
    ///
    /// Repeated calls with the same date return the same id and leave the row
    /// count unchanged. The check-then-insert sequence has a race window, so
    /// this process must be the only writer.
    pub fn date_id(&self, table: DateTable, date: NaiveDateTime) -> Result<i64, ObsWxErr> {
        let select = format!("SELECT id FROM {} WHERE date = ?1", table.as_static());

        if let Some(id) = self.optional_id(&select, &[&date as &dyn ToSql])? {
            return Ok(id);
        }

        self.db_conn.execute(
            &format!("INSERT INTO {} (date) VALUES (?1)", table.as_static()),
            &[&date as &dyn ToSql],
        )?;

        // Read the row back to learn the id it was assigned.
        match self.optional_id(&select, &[&date as &dyn ToSql])? {
            Some(id) => Ok(id),
            None => Err(ObsWxErr::DataIntegrity(format!(
                "{} row missing after insert for {}",
                table.as_static(),
                date
            ))),
        }
    }

    /// Upsert the forecast row for `(forecast_type_id, weather_date_id)` and
    /// return its id.
    ///
    /// An existing row for the key is left untouched. The id is re-queried by
    /// the same key in either case.
    pub fn add_forecast(
        &self,
        forecast_type_id: i32,
        weather_date_id: i64,
        forecast_time_id: i64,
        import_time_id: i64,
        record: &WeatherRecord,
    ) -> Result<i64, ObsWxErr> {
        let select = "SELECT id FROM forecasts
                      WHERE forecast_type_id = ?1 AND weather_date_id = ?2";
        let key: [&dyn ToSql; 2] = [&forecast_type_id, &weather_date_id];

        if self.optional_id(select, &key)?.is_none() {
            self.db_conn.execute(
                "INSERT INTO forecasts (forecast_type_id, weather_date_id, forecast_time_id,
                      import_time_id, wind_speed, wind_speed_mph)
                      VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                &[
                    &forecast_type_id as &dyn ToSql,
                    &weather_date_id,
                    &forecast_time_id,
                    &import_time_id,
                    &record.speed_mps,
                    &record.speed_mph,
                ],
            )?;
        }

        match self.optional_id(select, &key)? {
            Some(id) => Ok(id),
            None => Err(ObsWxErr::DataIntegrity(format!(
                "forecasts row missing after insert for type {} date id {}",
                forecast_type_id, weather_date_id
            ))),
        }
    }

    /// Insert the per-frequency rows for `forecast_id`.
    ///
    /// A row that already exists for `(forecast_id, frequency)` is left
    /// untouched; a cell is immutable once written. The tsys column stores
    /// the forecast atmospheric temperature.
    pub fn add_forecast_by_frequency(
        &self,
        forecast_id: i64,
        atmosphere: &Atmosphere,
    ) -> Result<(), ObsWxErr> {
        let select = "SELECT id FROM forecast_by_frequency
                      WHERE forecast_id = ?1 AND frequency = ?2";

        for (i, &freq) in atmosphere.freqs.iter().enumerate() {
            if self
                .optional_id(select, &[&forecast_id as &dyn ToSql, &freq])?
                .is_some()
            {
                continue;
            }

            self.db_conn.execute(
                "INSERT INTO forecast_by_frequency (frequency, opacity, tsys, forecast_id)
                      VALUES (?1, ?2, ?3, ?4)",
                &[
                    &freq as &dyn ToSql,
                    &atmosphere.opacity[i],
                    &atmosphere.tatm[i],
                    &forecast_id,
                ],
            )?;
        }

        Ok(())
    }

    /// Insert a measured-weather row for a date, with whatever values exist.
    ///
    /// No row is added when both values are missing.
    pub fn add_gbt_weather(
        &self,
        weather_date_id: i64,
        wind_speed: Option<f64>,
        irradiance: Option<f64>,
    ) -> Result<(), ObsWxErr> {
        if wind_speed.is_none() && irradiance.is_none() {
            return Ok(());
        }

        self.db_conn.execute(
            "INSERT INTO gbt_weather (weather_date_id, wind_speed, irradiance)
                  VALUES (?1, ?2, ?3)",
            &[&weather_date_id as &dyn ToSql, &wind_speed, &irradiance],
        )?;

        Ok(())
    }

    // Query for a single id, mapping "no rows" to None and a wrongly typed id
    // column to a DataIntegrity error the import loop can recover from.
    fn optional_id(&self, select: &str, params: &[&dyn ToSql]) -> Result<Option<i64>, ObsWxErr> {
        match self
            .db_conn
            .query_row(select, params, |row| row.get::<_, i64>(0))
        {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err @ rusqlite::Error::InvalidColumnType(..)) => {
                Err(ObsWxErr::DataIntegrity(err.to_string()))
            }
            Err(err) => Err(ObsWxErr::Database(err)),
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
