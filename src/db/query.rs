use chrono::NaiveDateTime;
use rusqlite::types::ToSql;
use strum::AsStaticRef;
use strum_macros::{AsStaticStr, EnumIter, EnumString};

use super::WeatherDb;

use crate::errors::ObsWxErr;

/// The value columns of the gbt_weather table that can be repaired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsStaticStr, EnumIter)]
pub enum GbtWeatherColumn {
    /// Median measured wind speed, in m/s.
    #[strum(to_string = "wind_speed", serialize = "wind-speed")]
    WindSpeed,
    /// Median measured downward irradiance, in W/m^2.
    #[strum(to_string = "irradiance")]
    Irradiance,
}

impl WeatherDb {
    /// Weather dates in `[start, end)` with no measured-weather row yet.
    ///
    /// Returned in chronological order.
    pub fn missing_weather_dates(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<(i64, NaiveDateTime)>, ObsWxErr> {
        let mut stmt = self.db_conn.prepare(
            "SELECT id, date
                  FROM weather_dates
                  WHERE id NOT IN (SELECT weather_date_id FROM gbt_weather)
                        AND date >= ?1
                        AND date < ?2
                  ORDER BY date",
        )?;

        let vals: Result<Vec<(i64, NaiveDateTime)>, _> = stmt
            .query_map(&[&start as &dyn ToSql, &end], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect();

        vals.map_err(ObsWxErr::Database)
    }

    /// Measured-weather rows where `column` is NULL, with their dates.
    ///
    /// Optionally restricted to dates in `[start, end)`. Returned in
    /// chronological order.
    pub fn null_value_rows(
        &self,
        column: GbtWeatherColumn,
        range: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Result<Vec<(i64, NaiveDateTime)>, ObsWxErr> {
        let base = format!(
            "SELECT gbt.id, wd.date
                  FROM gbt_weather AS gbt JOIN weather_dates AS wd
                       ON gbt.weather_date_id = wd.id
                  WHERE gbt.{} IS NULL",
            column.as_static()
        );

        let vals: Result<Vec<(i64, NaiveDateTime)>, _> = match range {
            Some((start, end)) => {
                let mut stmt = self.db_conn.prepare(&format!(
                    "{} AND wd.date >= ?1 AND wd.date < ?2 ORDER BY wd.date",
                    base
                ))?;

                let vals = stmt
                    .query_map(&[&start as &dyn ToSql, &end], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })?
                    .collect();
                vals
            }
            None => {
                let mut stmt = self.db_conn.prepare(&format!("{} ORDER BY wd.date", base))?;

                let vals = stmt
                    .query_map(rusqlite::NO_PARAMS, |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect();
                vals
            }
        };

        vals.map_err(ObsWxErr::Database)
    }

    /// Set `column` on exactly one measured-weather row.
    ///
    /// Unconditional; the current cell value is not re-checked first.
    pub fn update_gbt_weather(
        &self,
        row_id: i64,
        column: GbtWeatherColumn,
        value: f64,
    ) -> Result<(), ObsWxErr> {
        self.db_conn.execute(
            &format!(
                "UPDATE gbt_weather SET {} = ?1 WHERE id = ?2",
                column.as_static()
            ),
            &[&value as &dyn ToSql, &row_id],
        )?;

        Ok(())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
