//! Densify sparse hourly series files by linear interpolation.
//!
//! The weather simulation files cover one calendar year of hourly rows, but
//! some hours are missing. The routines here rewrite each file with every
//! hour present: known rows are copied verbatim and gaps are filled by
//! straight linear interpolation between the bracketing known rows. No
//! smoothing, no extrapolation.

use std::{fs, path::Path};

use chrono::{NaiveDate, NaiveDateTime};

use crate::{errors::ObsWxErr, mjd};

/// Hours in the simulation year. The densified output covers hours
/// `0..=HOURS_PER_YEAR`, one row each.
pub const HOURS_PER_YEAR: i64 = 24 * 365;

// The chunk file names are the producer's contract, year included.
const FILE_PREFIX: &str = "simulateTime_2006_";
const FILE_SUFFIXES: [&str; 5] = ["0-11", "12-23", "24-35", "36-47", "48-59"];

/// Hour zero of the simulation year the chunk files cover.
pub fn series_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd(2006, 1, 1).and_hms(0, 0, 0)
}

/// One row of an hour-indexed series.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesRow {
    /// Whole hours since the series epoch.
    pub hour: i64,
    /// The value columns, in file order.
    pub values: Vec<f64>,
}

/// Read a series file, converting the leading MJD column of each row to an
/// hour offset from `origin`.
///
/// Leading rows that precede `origin` are artifacts of how the source files
/// are produced and are dropped.
pub fn read_series(path: &Path, origin: NaiveDateTime) -> Result<Vec<SeriesRow>, ObsWxErr> {
    let text = fs::read_to_string(path)?;
    parse_series(&text, origin)
}

/// Decode the text of a series file. See [`read_series`].
pub fn parse_series(text: &str, origin: NaiveDateTime) -> Result<Vec<SeriesRow>, ObsWxErr> {
    let mut data = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let mjd: f64 = fields
            .next()
            .ok_or_else(|| ObsWxErr::BadRow(line.to_owned()))?
            .parse()?;
        let values: Result<Vec<f64>, _> = fields.map(str::parse).collect();

        data.push(SeriesRow {
            hour: mjd::hour_offset(mjd::to_datetime(mjd), origin),
            values: values?,
        });
    }

    let first_valid = data
        .iter()
        .position(|row| row.hour >= 0)
        .unwrap_or_else(|| data.len());

    Ok(data.split_off(first_valid))
}

/// Densify a sparse series to one row per hour over `0..=HOURS_PER_YEAR`.
///
/// The input must be strictly increasing in `hour`, start at hour 0, and
/// reach at least `HOURS_PER_YEAR`; anything less is `NotEnoughData` since
/// interpolation cannot extrapolate past the last known row.
pub fn densify(data: &[SeriesRow]) -> Result<Vec<SeriesRow>, ObsWxErr> {
    densify_to(data, HOURS_PER_YEAR)
}

/// Densify a sparse series to one row per hour over `0..=last_hour`.
pub fn densify_to(data: &[SeriesRow], last_hour: i64) -> Result<Vec<SeriesRow>, ObsWxErr> {
    let spans_range = data.first().map_or(false, |row| row.hour == 0)
        && data.last().map_or(false, |row| row.hour >= last_hour);
    if !spans_range {
        return Err(ObsWxErr::NotEnoughData);
    }

    let mut retval = Vec::with_capacity(last_hour as usize + 1);
    let mut i = 0;

    for hour in 0..=last_hour {
        if data[i].hour == hour {
            // Have data for this hour, just copy it.
            retval.push(data[i].clone());
            i += 1;
        } else {
            // Interpolate between the last known row and the next one.
            let prev = &data[i - 1];
            let next = &data[i];
            let values = prev
                .values
                .iter()
                .zip(next.values.iter())
                .map(|(&ya, &yb)| interpolate(hour, prev.hour, next.hour, ya, yb))
                .collect();

            retval.push(SeriesRow { hour, values });
        }
    }

    Ok(retval)
}

// Known points (xa, ya) and (xb, yb) define a line; evaluate it at x.
fn interpolate(x: i64, xa: i64, xb: i64, ya: f64, yb: f64) -> f64 {
    ya + ((x - xa) as f64) * (yb - ya) / ((xb - xa) as f64)
}

/// Write a densified series, one row per line, space-separated.
///
/// The hour column is dropped; a row's position implies its offset.
pub fn write_series(path: &Path, data: &[SeriesRow]) -> Result<(), ObsWxErr> {
    let mut out = String::new();

    for row in data {
        let mut sep = "";
        for value in &row.values {
            out.push_str(sep);
            out.push_str(&value.to_string());
            sep = " ";
        }
        out.push('\n');
    }

    fs::write(path, out)?;

    Ok(())
}

/// Densify every chunk file from `read_dir` into `write_dir`.
///
/// The five chunk files keep the names the producer gave them.
pub fn fill(read_dir: &Path, write_dir: &Path) -> Result<(), ObsWxErr> {
    for suffix in &FILE_SUFFIXES {
        let filename = format!("{}{}.txt", FILE_PREFIX, suffix);

        let data = read_series(&read_dir.join(&filename), series_epoch())?;
        let data = densify(&data)?;
        write_series(&write_dir.join(&filename), &data)?;
    }

    Ok(())
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
