use std::path::{Path, PathBuf};

use super::WeatherDb;

use crate::errors::ObsWxErr;

/// The default location for the database directory.
pub fn default_root() -> PathBuf {
    let default_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("./"));

    default_dir.join("obswx")
}

impl WeatherDb {
    const DB_FILE: &'static str = "weather.db";

    /// Initialize a new database, creating the root directory if needed.
    pub fn create(root: &dyn AsRef<Path>) -> Result<Self, ObsWxErr> {
        let db_file = root.as_ref().join(WeatherDb::DB_FILE);

        std::fs::create_dir_all(root.as_ref())?;

        // Create and set up the database
        let db_conn = rusqlite::Connection::open_with_flags(
            db_file,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        db_conn.execute_batch(include_str!("root/create.sql"))?;

        Ok(WeatherDb { db_conn })
    }

    /// Open an existing database.
    pub fn connect(root: &dyn AsRef<Path>) -> Result<Self, ObsWxErr> {
        let db_file = root.as_ref().join(WeatherDb::DB_FILE);

        let db_conn = rusqlite::Connection::open_with_flags(
            db_file,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE,
        )?;

        Self::validate_db_structure(&db_conn)?;

        Ok(WeatherDb { db_conn })
    }

    /// Validate the database structure is correct.
    fn validate_db_structure(db_conn: &rusqlite::Connection) -> Result<(), ObsWxErr> {
        // Check the number of tables
        let num_tables: i64 = db_conn.query_row(
            "SELECT COUNT(name) FROM sqlite_master WHERE type='table' ORDER BY name",
            rusqlite::NO_PARAMS,
            |row| row.get(0),
        )?;

        if num_tables != 6 {
            return Err(ObsWxErr::InvalidSchema);
        }

        // Check the table names.
        let mut stmt =
            db_conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;

        let iter = stmt.query_map(rusqlite::NO_PARAMS, |row: &rusqlite::Row| {
            let name: String = row.get(0)?;

            match name.as_ref() {
                "forecast_times" | "import_times" | "weather_dates" | "forecasts"
                | "forecast_by_frequency" | "gbt_weather" => Ok(true),
                _ => Ok(false),
            }
        })?;

        for valid in iter {
            match valid {
                Ok(true) => {}
                Ok(false) => return Err(ObsWxErr::InvalidSchema),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}
