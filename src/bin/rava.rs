//! CLI for running an analysis
//!
//! rava analyze SPY --parquet-dir data/ > report.json
//! rava summary --input spy.json
//! rava export GSPC --parquet-dir data/ --csv gspc.csv

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rava_analytics::frame::{write_csv, write_parquet};
use rava_analytics::source::{read_json_records, JsonDirSource, ParquetSource};
use rava_analytics::{analyze_records, analyze_symbol, AnalysisConfig, AnalysisReport};

#[derive(Parser)]
#[command(name = "rava")]
#[command(about = "Risk and volatility analysis of a daily price series")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full report as JSON
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the headline metrics table
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write the aligned table to CSV and/or parquet
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// CSV output path (date, close, return, longest volatility, drawdown)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Parquet output path (full table)
        #[arg(long)]
        parquet: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Symbol to fetch, e.g. SPY or GSPC
    symbol: Option<String>,

    /// JSON array of raw records, instead of fetching a symbol
    #[arg(long, conflicts_with_all = ["parquet_dir", "json_dir"])]
    input: Option<PathBuf>,

    /// Directory of <symbol>.parquet files
    #[arg(long, env = "PARQUET_DIR", conflicts_with = "json_dir")]
    parquet_dir: Option<PathBuf>,

    /// Directory of <symbol>.json files
    #[arg(long)]
    json_dir: Option<PathBuf>,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// JSON config file; RAVA_* environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn run(args: &InputArgs) -> Result<AnalysisReport, Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_ref())?;

    if let Some(path) = &args.input {
        let raw = read_json_records(path)?;
        return Ok(analyze_records(&raw, args.symbol.as_deref(), &config)?);
    }

    let symbol = args
        .symbol
        .as_deref()
        .ok_or("a symbol is required unless --input is given")?;

    let report = match (&args.parquet_dir, &args.json_dir) {
        (_, Some(dir)) => analyze_symbol(&JsonDirSource::new(dir), symbol, args.start, &config)?,
        (Some(dir), None) => analyze_symbol(&ParquetSource::new(dir), symbol, args.start, &config)?,
        (None, None) => return Err("one of --input, --parquet-dir or --json-dir is required".into()),
    };
    Ok(report)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { input, pretty } => {
            let report = run(&input)?;
            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
        Commands::Summary { input } => {
            let report = run(&input)?;
            let mut stdout = io::stdout().lock();
            if let Some(symbol) = &report.symbol {
                writeln!(stdout, "{} ({} to {})", symbol, report.start_date, report.end_date)?;
            }
            for (label, value) in report.metrics.summary_table(report.trading_days) {
                writeln!(stdout, "{:<24}{:>12}", label, value)?;
            }
            for episode in &report.episodes {
                writeln!(
                    stdout,
                    "drawdown {} -> {}  {:.2}%  {} days",
                    episode.peak_date, episode.trough_date, episode.drawdown_pct, episode.duration_days
                )?;
            }
        }
        Commands::Export { input, csv, parquet } => {
            if csv.is_none() && parquet.is_none() {
                return Err("nothing to export: pass --csv and/or --parquet".into());
            }
            let report = run(&input)?;
            if let Some(path) = csv {
                write_csv(&report, File::create(&path)?)?;
                info!(path = %path.display(), "wrote csv");
            }
            if let Some(path) = parquet {
                let bytes = write_parquet(&report, File::create(&path)?)?;
                info!(path = %path.display(), bytes, "wrote parquet");
            }
        }
    }

    Ok(())
}
