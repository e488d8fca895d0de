//! wxfill
//!
//! Maintenance operations for the scheduling weather data: rewrite the
//! weather simulation chunk files with every hour of the year present, fill
//! NULL measurement columns from the site's hourly sample file, and insert
//! measured-weather rows for dates that have none.

use chrono::{NaiveDateTime, Utc};
use obswx_data::{
    backfill_irradiance, backfill_wind, default_root, fill, update_weather, FileSamples,
    GbtWeatherColumn, WeatherDb,
};
use std::{error::Error, path::PathBuf, str::FromStr};
use strum::{AsStaticRef, IntoEnumIterator};

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

pub fn bail(msg: &str) -> ! {
    println!("{}", msg);
    ::std::process::exit(1);
}

fn run() -> Result<(), Box<dyn Error>> {
    let column_names: Vec<&str> = GbtWeatherColumn::iter().map(|col| col.as_static()).collect();

    let app = clap::App::new("wxfill")
        .author("Ryan <rnleach@users.noreply.github.com>")
        .version(clap::crate_version!())
        .about("Densify simulation series files and repair the weather database.")
        .arg(
            clap::Arg::with_name("operation")
                .index(1)
                .takes_value(true)
                .required(true)
                .possible_values(&["interp", "backfill", "update"])
                .help("Densify series files, backfill a column, or insert missing rows.")
                .long_help(concat!(
                    "'interp' rewrites the series chunk files from <read-dir> into <write-dir>",
                    " with every hour of the year present. 'backfill' fills NULL cells of the",
                    " --column from the --samples file. 'update' inserts measured-weather rows",
                    " for dates in the year before --end that have none, from the --samples",
                    " file.",
                )),
        )
        .arg(
            clap::Arg::with_name("read-dir")
                .index(2)
                .help("Directory holding the sparse chunk files (interp only)."),
        )
        .arg(
            clap::Arg::with_name("write-dir")
                .index(3)
                .help("Directory the densified chunk files are written to (interp only)."),
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
            clap::Arg::with_name("samples")
                .short("s")
                .long("samples")
                .takes_value(true)
                .help("Hourly sample file with 'MJD wind-speed irradiance' rows."),
        )
        .arg(
            clap::Arg::with_name("column")
                .short("c")
                .long("column")
                .takes_value(true)
                .possible_values(&column_names)
                .help("The column to backfill."),
        )
        .arg(
            clap::Arg::with_name("dry-run")
                .long("dry-run")
                .help("Report what backfill would write without writing it."),
        )
        .arg(
            clap::Arg::with_name("end")
                .long("end")
                .takes_value(true)
                .help("End of the update window, e.g. 2009-05-04T12:00:00. Defaults to now."),
        );

    let matches = app.get_matches();

    match matches.value_of("operation").unwrap() {
        "interp" => interp(&matches),
        "backfill" => run_backfill(&matches),
        "update" => run_update(&matches),
        _ => bail("Unknown operation."),
    }
}

fn interp(matches: &clap::ArgMatches) -> Result<(), Box<dyn Error>> {
    let read_dir = matches
        .value_of("read-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| bail("interp requires a <read-dir> argument."));
    let write_dir = matches
        .value_of("write-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| bail("interp requires a <write-dir> argument."));

    fill::fill(&read_dir, &write_dir)?;

    println!("Filled series written to {}.", write_dir.display());

    Ok(())
}

fn run_backfill(matches: &clap::ArgMatches) -> Result<(), Box<dyn Error>> {
    let column = matches
        .value_of("column")
        .map(GbtWeatherColumn::from_str)
        .unwrap_or_else(|| bail("backfill requires a --column argument."))?;

    let db = connect(matches)?;
    let samples = load_samples(matches)?;
    let dry_run = matches.is_present("dry-run");

    let results = match column {
        GbtWeatherColumn::WindSpeed => backfill_wind(&db, &samples, dry_run)?,
        GbtWeatherColumn::Irradiance => backfill_irradiance(&db, &samples, dry_run)?,
    };

    for record in &results {
        println!("{},{},{}", record.row_id, record.timestamp, record.value);
    }
    println!(
        "{} {} rows for {}.",
        if dry_run { "Would fill" } else { "Filled" },
        results.len(),
        column.as_static()
    );

    Ok(())
}

fn run_update(matches: &clap::ArgMatches) -> Result<(), Box<dyn Error>> {
    let db = connect(matches)?;
    let samples = load_samples(matches)?;

    let end = match matches.value_of("end") {
        Some(end) => NaiveDateTime::parse_from_str(end, "%Y-%m-%dT%H:%M:%S")?,
        None => Utc::now().naive_utc(),
    };

    let results = update_weather(&db, &samples, end)?;

    for (date_id, wind, irradiance) in &results {
        match irradiance {
            Some(irradiance) => println!("{},{},{}", date_id, wind, irradiance),
            None => println!("{},{},", date_id, wind),
        }
    }
    println!("Inserted {} weather rows.", results.len());

    Ok(())
}

fn connect(matches: &clap::ArgMatches) -> Result<WeatherDb, Box<dyn Error>> {
    let root = matches
        .value_of("root")
        .map(PathBuf::from)
        .unwrap_or_else(default_root);

    Ok(WeatherDb::connect(&root)?)
}

fn load_samples(matches: &clap::ArgMatches) -> Result<FileSamples, Box<dyn Error>> {
    let path = matches
        .value_of("samples")
        .map(PathBuf::from)
        .unwrap_or_else(|| bail("this operation requires a --samples file."));

    Ok(FileSamples::load(&path)?)
}
