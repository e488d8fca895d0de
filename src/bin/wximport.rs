//! wximport
//!
//! Import a pair of forecast files into the scheduling weather database. The
//! two files come from the external forecast producer: the "ground" file with
//! averaged scalar quantities and the "atmosphere" file with the
//! frequency-indexed quantities.

use chrono::NaiveDateTime;
use obswx_data::{default_root, ForecastImport, NoCorrection, WeatherDb};
use std::{error::Error, path::PathBuf};

fn main() {
    if let Err(e) = run() {
        println!("error: {}", e);

        let mut err = &*e;

        while let Some(cause) = err.source() {
            println!("caused by: {}", cause);
            err = cause;
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let app = clap::App::new("wximport")
        .author("Ryan <rnleach@users.noreply.github.com>")
        .version(clap::crate_version!())
        .about("Import forecast files into the scheduling weather database.")
        .arg(
            clap::Arg::with_name("forecast-time")
                .short("f")
                .long("forecast-time")
                .takes_value(true)
                .required(true)
                .help("UTC time the forecast was issued, e.g. 2009-05-04T12:00:00."),
        )
        .arg(
            clap::Arg::with_name("root")
                .short("r")
                .long("root")
                .takes_value(true)
                .help("Set the root of the database directory.")
                .long_help(concat!(
                    "Set the directory containing weather.db.",
                    " Defaults to '${HOME}/obswx'."
                )),
        )
        .arg(
            clap::Arg::with_name("create")
                .long("create")
                .help("Create the database first if it does not exist."),
        )
        .arg(
            clap::Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Do not echo the report while running."),
        )
        .arg(
            clap::Arg::with_name("ground-file")
                .index(1)
                .required(true)
                .help("The ground (wind) forecast file."),
        )
        .arg(
            clap::Arg::with_name("atmo-file")
                .index(2)
                .required(true)
                .help("The atmosphere-by-frequency forecast file."),
        );

    let matches = app.get_matches();

    let root = matches
        .value_of("root")
        .map(PathBuf::from)
        .unwrap_or_else(default_root);

    let forecast_time = NaiveDateTime::parse_from_str(
        matches.value_of("forecast-time").unwrap(),
        "%Y-%m-%dT%H:%M:%S",
    )?;

    let ground_path = PathBuf::from(matches.value_of("ground-file").unwrap());
    let atmo_path = PathBuf::from(matches.value_of("atmo-file").unwrap());
    let quiet = matches.is_present("quiet");

    let db = if matches.is_present("create") {
        WeatherDb::create(&root)?
    } else {
        WeatherDb::connect(&root)?
    };

    let import = ForecastImport::new(forecast_time, NoCorrection);
    let report = import.run(&db, &ground_path, &atmo_path, quiet)?;

    println!(
        "Inserted {} timestamps, skipped {}.",
        report.num_inserted(),
        report.num_skipped()
    );

    Ok(())
}
