//! `import_data`: replace the shelter collection with the contents of a CSV.
//!
//! # Responsibility
//! - Run the read, connect, clear, insert and report stages in order.
//! - Map the first failing stage to a non-zero exit code.

use clap::Parser;
use log::error;
use shelter_core::loader::{clear_collection, format_sample, insert_table, summarize};
use shelter_core::{
    core_version, init_console_logging, read_table, CsvConfig, DbConfig, DbError, LoadError,
    MongoStore, DEFAULT_CSV_FILE,
};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_CLI_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "import_data")]
#[command(about = "Load the shelter outcomes CSV into the local MongoDB collection")]
#[command(version)]
struct Cli {
    /// CSV file to import
    #[arg(default_value = DEFAULT_CSV_FILE)]
    csv_file: PathBuf,

    /// Log verbosity: trace, debug, info, warn, error
    #[arg(long, default_value = DEFAULT_CLI_LOG_LEVEL)]
    log_level: String,
}

/// First stage that failed.
#[derive(Debug)]
enum Failure {
    Read(LoadError),
    Connect(DbError),
    Write(LoadError),
}

impl Failure {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Read(_) => 1,
            Self::Connect(_) => 2,
            Self::Write(_) => 3,
        }
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "Error reading CSV: {err}"),
            Self::Connect(err) => write!(f, "Error connecting to MongoDB: {err}"),
            Self::Write(err) => write!(f, "Error inserting data: {err}"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_console_logging(&cli.log_level) {
        eprintln!("{err}");
        return ExitCode::from(64);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(
                "event=import module=cli status=error exit_code={} error={}",
                failure.exit_code(),
                failure
            );
            println!("{failure}");
            ExitCode::from(failure.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    println!("Animal shelter import (shelter_core {})", core_version());

    println!("\n[1/4] Reading CSV file: {}", cli.csv_file.display());
    let table = read_table(&cli.csv_file, &CsvConfig::default()).map_err(Failure::Read)?;
    println!("Successfully loaded {} records from CSV", table.len());

    let config = DbConfig::default();
    println!("\n[2/4] Connecting to MongoDB at {} ...", config.uri());
    let store = MongoStore::open(&config).map_err(Failure::Connect)?;
    println!("Connected to {}", store.namespace());

    println!("\n[3/4] Clearing existing data...");
    let cleared = clear_collection(&store).map_err(Failure::Write)?;
    println!("Removed {cleared} existing documents");

    println!("\n[4/4] Inserting data into MongoDB...");
    let inserted = insert_table(&store, &table).map_err(Failure::Write)?;
    println!("Successfully inserted {inserted} documents!");

    let (total, sample) = summarize(&store);
    if let Some(total) = total {
        println!("\nTotal documents in collection: {total}");
    }
    if let Some(sample) = sample {
        println!("\nSample document:");
        for line in format_sample(&sample) {
            println!("  {line}");
        }
    }

    println!("\nData import complete!");
    Ok(())
}
