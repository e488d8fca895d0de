//! Module for errors.
use std::{error::Error, fmt::Display, path::PathBuf};

/// Error from the weather import interface.
#[derive(Debug)]
pub enum ObsWxErr {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),
    /// A field that should have been a number was not parseable.
    ParseFloat(::std::num::ParseFloatError),

    // Other forwarded errors
    /// Database error
    Database(::rusqlite::Error),
    /// Error forwarded from the strum crate
    StrumError(strum::ParseError),

    // My own errors from this crate
    /// The first line of a forecast file did not match the expected header.
    HeaderMismatch {
        /// The offending file.
        path: PathBuf,
        /// The start of the header that was expected.
        expected: String,
    },
    /// The database structure is wrong.
    InvalidSchema,
    /// A persisted row had an unexpected shape.
    DataIntegrity(String),
    /// Not enough data to complete the task.
    NotEnoughData,
    /// A data row in a forecast or series file was malformed.
    BadRow(String),
}

impl Display for ObsWxErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::ObsWxErr::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),
            ParseFloat(err) => write!(f, "error parsing a numeric field: {}", err),

            Database(err) => write!(f, "database error: {}", err),
            StrumError(err) => write!(f, "error forwarded from strum crate: {}", err),

            HeaderMismatch { path, expected } => write!(
                f,
                "header of {} does not match the expected header starting with: {}",
                path.display(),
                expected
            ),
            InvalidSchema => write!(f, "invalid database format"),
            DataIntegrity(msg) => write!(f, "unexpected row shape in the database: {}", msg),
            NotEnoughData => write!(f, "not enough data to complete task"),
            BadRow(msg) => write!(f, "malformed data row: {}", msg),
        }
    }
}

impl Error for ObsWxErr {}

impl From<::std::io::Error> for ObsWxErr {
    fn from(err: ::std::io::Error) -> ObsWxErr {
        ObsWxErr::IO(err)
    }
}

impl From<::std::num::ParseFloatError> for ObsWxErr {
    fn from(err: ::std::num::ParseFloatError) -> ObsWxErr {
        ObsWxErr::ParseFloat(err)
    }
}

impl From<::rusqlite::Error> for ObsWxErr {
    fn from(err: ::rusqlite::Error) -> ObsWxErr {
        ObsWxErr::Database(err)
    }
}

impl From<strum::ParseError> for ObsWxErr {
    fn from(err: strum::ParseError) -> ObsWxErr {
        ObsWxErr::StrumError(err)
    }
}
