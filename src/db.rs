//! The scheduling weather database.

/// A connection to the scheduling weather database.
///
/// One connection per run, used serially. None of the find-or-create
/// operations are safe with a second writer racing on the same keys.
#[derive(Debug)]
pub struct WeatherDb {
    db_conn: rusqlite::Connection, // An sqlite connection.
}

mod add_data;
mod query;
mod root;

pub use self::add_data::DateTable;
pub use self::query::GbtWeatherColumn;
pub use self::root::default_root;

#[cfg(test)]
impl WeatherDb {
    /// Count the rows of a table, for checking idempotence in tests.
    pub(crate) fn count_rows(&self, table: &str) -> Result<i64, crate::ObsWxErr> {
        let count: i64 = self.db_conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table),
            rusqlite::NO_PARAMS,
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// Fetch the wind speeds of a forecast row by its natural key.
    pub(crate) fn forecast_speeds(
        &self,
        forecast_type_id: i32,
        weather_date_id: i64,
    ) -> Result<(f64, f64), crate::ObsWxErr> {
        let speeds = self.db_conn.query_row(
            "SELECT wind_speed, wind_speed_mph FROM forecasts
                  WHERE forecast_type_id = ?1 AND weather_date_id = ?2",
            &[
                &forecast_type_id as &dyn rusqlite::types::ToSql,
                &weather_date_id as &dyn rusqlite::types::ToSql,
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(speeds)
    }

    /// Fetch all per-frequency rows for a forecast, ordered by frequency.
    pub(crate) fn frequency_rows(
        &self,
        forecast_id: i64,
    ) -> Result<Vec<(i32, f64, f64)>, crate::ObsWxErr> {
        let mut stmt = self.db_conn.prepare(
            "SELECT frequency, opacity, tsys FROM forecast_by_frequency
                  WHERE forecast_id = ?1 ORDER BY frequency",
        )?;

        let vals: Result<Vec<(i32, f64, f64)>, _> = stmt
            .query_map(&[&forecast_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect();

        vals.map_err(crate::ObsWxErr::Database)
    }

    /// Fetch the value columns of a gbt_weather row.
    pub(crate) fn gbt_weather_row(
        &self,
        row_id: i64,
    ) -> Result<(Option<f64>, Option<f64>), crate::ObsWxErr> {
        let row = self.db_conn.query_row(
            "SELECT wind_speed, irradiance FROM gbt_weather WHERE id = ?1",
            &[&row_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(row)
    }
}
