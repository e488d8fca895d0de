//! Decoders for the two text file formats written by the forecast producer.
//!
//! Both formats are whitespace-delimited with a single header line that must
//! match a fixed string exactly. Columns are addressed positionally after
//! that, so a header mismatch is a contract violation, not a warning, and
//! aborts the file.

use std::{collections::HashMap, fs, path::Path};

use chrono::NaiveDateTime;

use crate::{errors::ObsWxErr, mjd, record::Atmosphere};

/// The header the ground (wind) file must start with.
pub const GROUND_FILE_HEADER: &str = "timeListMJD pwatTimeList_avrg smphTimeList_avrg \
     smph75mTimeList_avrg drctTimeList_avrg presTimeList_avrg tmpcTimeList_avrg \
     humidTimeList_avrg dwpcTimeList_avrg";

/// Field name the merged record reads the forecast wind speed under.
pub const SPEED_MPH: &str = "speed_mph";

// Mapping of ground-file header columns to record field names. Adding a new
// scalar quantity only takes a new pair here.
const GROUND_FILE_COLUMNS: &[(&str, &str)] = &[("smphTimeList_avrg", SPEED_MPH)];

/// Number of frequencies the atmosphere file is calculated at.
pub const NUM_ATMO_FREQS: usize = 50;

// Site name baked into the atmosphere file's column names.
const ATMO_SITE: &str = "HotSprings";

// The three column blocks of the atmosphere file, in file order.
const ATMO_BLOCKS: [&str; 3] = ["OpacityTime", "TsysTime", "TatmTime"];

/// The frequencies, in GHz, of the atmosphere file columns.
pub fn atmo_freqs() -> Vec<i32> {
    (1..=NUM_ATMO_FREQS as i32).collect()
}

/// The header the atmosphere file must start with.
///
/// `timeListMJD` followed by one column per block per frequency, e.g.
/// `OpacityTime7List_HotSprings`. Generated rather than stored because it is
/// 151 columns wide.
pub fn atmosphere_header() -> String {
    let mut header = String::from("timeListMJD");

    for block in &ATMO_BLOCKS {
        for freq in 1..=NUM_ATMO_FREQS {
            header.push_str(&format!(" {}{}List_{}", block, freq, ATMO_SITE));
        }
    }

    header
}

/// One data row of the ground file.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundRow {
    /// The observation hour the row describes.
    pub timestamp: NaiveDateTime,
    /// The configured scalar quantities, keyed by record field name.
    pub values: HashMap<&'static str, f64>,
}

/// One data row of the atmosphere file.
#[derive(Clone, Debug, PartialEq)]
pub struct AtmoRow {
    /// The observation hour the row describes.
    pub timestamp: NaiveDateTime,
    /// The three frequency-indexed vectors of the row.
    pub atmosphere: Atmosphere,
}

/// Read and decode a ground file.
pub fn load_ground(path: &Path) -> Result<Vec<GroundRow>, ObsWxErr> {
    let text = fs::read_to_string(path)?;
    parse_ground(&text, path)
}

/// Read and decode an atmosphere file.
pub fn load_atmosphere(path: &Path) -> Result<Vec<AtmoRow>, ObsWxErr> {
    let text = fs::read_to_string(path)?;
    parse_atmosphere(&text, path)
}

/// Decode the text of a ground file. `path` is only used in error values.
pub fn parse_ground(text: &str, path: &Path) -> Result<Vec<GroundRow>, ObsWxErr> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or("");

    if header.trim() != GROUND_FILE_HEADER {
        return Err(header_mismatch(path, GROUND_FILE_HEADER));
    }

    // Resolve the configured columns against the header once, not per row.
    let header_cols: Vec<&str> = header.split_whitespace().collect();
    let mut columns: Vec<(usize, &'static str)> = Vec::with_capacity(GROUND_FILE_COLUMNS.len());
    for &(col_name, field) in GROUND_FILE_COLUMNS {
        let index = header_cols
            .iter()
            .position(|col| *col == col_name)
            .ok_or_else(|| header_mismatch(path, col_name))?;
        columns.push((index, field));
    }

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let timestamp = mjd::to_hour(parse_field(&fields, 0, line)?);

        let mut values = HashMap::with_capacity(columns.len());
        for &(index, field) in &columns {
            values.insert(field, parse_field(&fields, index, line)?);
        }

        rows.push(GroundRow { timestamp, values });
    }

    Ok(rows)
}

/// Decode the text of an atmosphere file. `path` is only used in error values.
pub fn parse_atmosphere(text: &str, path: &Path) -> Result<Vec<AtmoRow>, ObsWxErr> {
    let expected_header = atmosphere_header();

    let mut lines = text.lines();
    let header = lines.next().unwrap_or("");

    if header.trim() != expected_header {
        return Err(header_mismatch(path, &expected_header));
    }

    let freqs = atmo_freqs();
    let num = NUM_ATMO_FREQS;

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 1 + 3 * num {
            return Err(ObsWxErr::BadRow(format!(
                "expected {} columns, found {}",
                1 + 3 * num,
                fields.len()
            )));
        }

        let timestamp = mjd::to_hour(parse_field(&fields, 0, line)?);

        let mut opacity = Vec::with_capacity(num);
        let mut tsys = Vec::with_capacity(num);
        let mut tatm = Vec::with_capacity(num);
        for i in 0..num {
            opacity.push(parse_field(&fields, 1 + i, line)?);
            tsys.push(parse_field(&fields, 1 + num + i, line)?);
            tatm.push(parse_field(&fields, 1 + 2 * num + i, line)?);
        }

        rows.push(AtmoRow {
            timestamp,
            atmosphere: Atmosphere {
                freqs: freqs.clone(),
                opacity,
                tsys,
                tatm,
            },
        });
    }

    Ok(rows)
}

fn parse_field(fields: &[&str], index: usize, line: &str) -> Result<f64, ObsWxErr> {
    let field = fields.get(index).ok_or_else(|| {
        ObsWxErr::BadRow(format!("missing column {} in: {}", index, line))
    })?;

    Ok(field.parse()?)
}

fn header_mismatch(path: &Path, expected: &str) -> ObsWxErr {
    ObsWxErr::HeaderMismatch {
        path: path.to_path_buf(),
        expected: expected.chars().take(40).collect(),
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
pub(crate) mod unit {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn ground_fixture(mjd: f64, speed_mph: f64) -> String {
        format!(
            "{}\n{} 2.5 {} 50.1 180.0 950.0 10.0 80.0 5.0\n",
            GROUND_FILE_HEADER, mjd, speed_mph
        )
    }

    // One row where block values are offset so each block is recognizable:
    // opacity 0.01..0.50, tsys 100.01..100.50, tatm 200.01..200.50.
    pub(crate) fn atmo_fixture(mjd: f64) -> String {
        let mut text = atmosphere_header();
        text.push('\n');
        text.push_str(&format!("{}", mjd));
        for block in 0..3 {
            for i in 0..NUM_ATMO_FREQS {
                text.push_str(&format!(" {}", block as f64 * 100.0 + (i + 1) as f64 / 100.0));
            }
        }
        text.push('\n');
        text
    }

    #[test]
    fn test_parse_ground() {
        let text = ground_fixture(51544.0, 44.74);
        let rows = parse_ground(&text, Path::new("fixture")).expect("Error parsing fixture.");

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].timestamp,
            NaiveDate::from_ymd(2000, 1, 1).and_hms(0, 0, 0)
        );
        assert_eq!(rows[0].values[SPEED_MPH], 44.74);
    }

    #[test]
    fn test_ground_header_mismatch_is_fatal() {
        let text = "timeListMJD smphTimeList_avrg\n51544.0 44.74\n";
        match parse_ground(text, Path::new("fixture")) {
            Err(ObsWxErr::HeaderMismatch { .. }) => {}
            Err(err) => panic!("Wrong error type returned: {}", err),
            Ok(_) => panic!("A bad header must not parse."),
        }
    }

    #[test]
    fn test_parse_atmosphere_blocks() {
        let text = atmo_fixture(51544.25);
        let rows = parse_atmosphere(&text, Path::new("fixture")).expect("Error parsing fixture.");

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].timestamp,
            NaiveDate::from_ymd(2000, 1, 1).and_hms(6, 0, 0)
        );

        let atmosphere = &rows[0].atmosphere;
        assert_eq!(atmosphere.freqs.len(), NUM_ATMO_FREQS);
        assert_eq!(atmosphere.freqs[0], 1);
        assert_eq!(atmosphere.freqs[49], 50);

        // Each quantity comes from its own block, index-aligned.
        assert!((atmosphere.opacity[0] - 0.01).abs() < 1e-9);
        assert!((atmosphere.opacity[49] - 0.50).abs() < 1e-9);
        assert!((atmosphere.tsys[0] - 100.01).abs() < 1e-9);
        assert!((atmosphere.tatm[0] - 200.01).abs() < 1e-9);
        assert!((atmosphere.tatm[49] - 200.50).abs() < 1e-9);
    }

    #[test]
    fn test_atmosphere_header_mismatch_is_fatal() {
        let text = "timeListMJD OpacityTime1List_Elsewhere\n51544.0 0.5\n";
        match parse_atmosphere(text, Path::new("fixture")) {
            Err(ObsWxErr::HeaderMismatch { .. }) => {}
            Err(err) => panic!("Wrong error type returned: {}", err),
            Ok(_) => panic!("A bad header must not parse."),
        }
    }

    #[test]
    fn test_atmosphere_short_row_is_an_error() {
        let mut text = atmosphere_header();
        text.push_str("\n51544.0 0.5 0.6\n");
        assert!(parse_atmosphere(&text, Path::new("fixture")).is_err());
    }
}
