mod config;
mod passes;
mod predict;
mod report;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{Config, TleSource};
use crate::predict::TleCatalog;
use crate::report::{run_report, ReportFormat};

#[derive(Parser)]
#[command(name = "pass-o-mat")]
#[command(about = "Satellite pass predictions for a ground station")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict passes for the watchlist and print a report
    Report {
        /// Configuration file (built-in defaults when omitted)
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Tab)]
        format: ReportFormat,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Read TLEs from a local file instead of downloading them
        #[arg(long)]
        tle: Option<PathBuf>,
        /// Window start: now, now+1h, or RFC3339
        #[arg(long)]
        start: Option<String>,
        /// Window length, e.g. 14h
        #[arg(long)]
        duration: Option<String>,
    },
    /// Validate a configuration file
    Validate { config: String },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            config,
            format,
            output,
            tle,
            start,
            duration,
        } => {
            let mut config = match config {
                Some(path) => match Config::from_file(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error loading {}: {}", path, e);
                        return ExitCode::FAILURE;
                    }
                },
                None => Config::default(),
            };
            if let Some(file) = tle {
                config.tle.url = None;
                config.tle.file = Some(file);
            }
            if let Some(start) = start {
                config.window.start = start;
            }
            if let Some(duration) = duration {
                config.window.duration = duration;
            }
            report(&config, format, output)
        }
        Commands::Validate { config } => validate(&config),
    }
}

fn validate(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    println!(
        "Config is valid ({} satellites)",
        config.watchlist.len()
    );
    println!(
        "  station: {} ({})",
        config.station.name.as_deref().unwrap_or("unnamed"),
        config.station.coordinates
    );
    println!(
        "  window: {} for {}",
        config.window.start, config.window.duration
    );
    println!("  min elevation: {}°", config.min_elevation_deg);
    println!("  timezone: {}", config.timezone);
    ExitCode::SUCCESS
}

fn report(config: &Config, format: ReportFormat, output: Option<PathBuf>) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let (station, params, source) = match (
        config.station(),
        config.report_params(Utc::now()),
        config.tle.source(),
    ) {
        (Ok(station), Ok(params), Ok(source)) => (station, params, source),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = match &source {
        TleSource::Url(url) => TleCatalog::fetch(url),
        TleSource::File(path) => TleCatalog::from_file(path),
    };
    let catalog = match catalog {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading TLE catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Predicting passes from {} to {} above {}°",
        params.start,
        params.end,
        params.min_elevation_deg
    );

    let mut out: Box<dyn Write> = match &output {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => {
                eprintln!("Error creating {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdout().lock()),
    };

    match run_report(
        &station,
        &config.watchlist,
        &catalog,
        &params,
        format,
        &mut out,
    ) {
        Ok(summary) => {
            log::info!(
                "{} passes for {} satellites ({} missing, {} still in progress at window end)",
                summary.passes,
                summary.satellites,
                summary.missing.len(),
                summary.incomplete
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Report failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
