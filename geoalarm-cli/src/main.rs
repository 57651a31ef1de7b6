//! GeoAlarm CLI - Command-line interface
//!
//! Usage:
//!     geoalarm distance 40.7128,-74.006 40.7306,-73.9352
//!     geoalarm simulate --destination 0,0 --track approach.txt
//!     geoalarm config set alarm.radius_km 0.5

mod commands;
mod error;
mod sink;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;

use geoalarm::coord::Coordinate;
use geoalarm::logging::{default_log_path, init_logging, LogConfig};

use commands::config::ConfigCommands;
use commands::simulate::SimulateArgs;
use error::CliError;

/// GeoAlarm - sound an alarm when you reach your destination
#[derive(Debug, Parser)]
#[command(name = "geoalarm")]
#[command(version)]
#[command(about = "Proximity alarm for a chosen destination", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to the default log file
    #[arg(long, global = true)]
    log: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Great-circle distance between two points
    Distance {
        /// Start point as LAT,LNG
        #[arg(allow_hyphen_values = true)]
        from: Coordinate,

        /// End point as LAT,LNG
        #[arg(allow_hyphen_values = true)]
        to: Coordinate,

        /// Print kilometers as a plain number
        #[arg(long)]
        raw: bool,
    },

    /// Replay a track and sound the alarm on arrival
    Simulate(SimulateArgs),

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Cli {
    /// Log file requested on the command line, if any.
    fn log_path(&self) -> Option<PathBuf> {
        match (&self.log_file, self.log) {
            (Some(path), _) => Some(path.clone()),
            (None, true) => Some(default_log_path()),
            (None, false) => None,
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let level = if cli.verbose { "geoalarm=debug" } else { "warn" };
    let mut log_config = LogConfig::default().with_level(level);
    if let Some(path) = cli.log_path() {
        log_config = log_config.with_log_file(path);
    }
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Commands::Distance { from, to, raw } => commands::distance::run(from, to, raw),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Config { command } => commands::config::run(command),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
