#![deny(missing_docs)]
//! Package to import observatory weather forecasts into a scheduling database.
//!
//! Forecast files keyed by Modified Julian Date are parsed, merged onto an
//! hourly timeline, classified by forecast horizon, and persisted with
//! find-or-create semantics so repeated imports never duplicate rows. Sparse
//! simulation series are densified by linear interpolation, and holes in
//! already-persisted measurements are patched from external sampled data.

//
// Public API
//
pub use crate::backfill::{
    backfill, backfill_irradiance, backfill_wind, update_weather, BackfillRecord, FileSamples,
    SampledSource,
};
pub use crate::db::{default_root, DateTable, GbtWeatherColumn, WeatherDb};
pub use crate::errors::ObsWxErr;
pub use crate::forecast_file::{load_atmosphere, load_ground, AtmoRow, GroundRow};
pub use crate::import::ForecastImport;
pub use crate::record::{merge, Atmosphere, NoCorrection, WeatherRecord, WindSpeedCorrector};
pub use crate::report::ImportReport;

pub mod fill;
pub mod horizon;
pub mod mjd;

//
// Implementation only
//
mod backfill;
mod db;
mod errors;
mod forecast_file;
mod import;
mod record;
mod report;
