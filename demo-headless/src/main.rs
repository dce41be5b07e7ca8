use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use flight_predict_core::dataset::{find_latest, parse_timestamp, scan};
use flight_predict_core::{Dataset, DatasetError, GridLayout, PredictorConfig, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Wind dataset maintenance tool
#[derive(Parser, Debug)]
#[command(name = "wind-datasets")]
#[command(about = "Inspect and create wind forecast datasets", long_about = None)]
struct Args {
    /// Dataset directory (defaults to the configured one)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List dataset files in the directory
    List {
        /// Only show files with this suffix ("" for primary grids); repeatable
        #[arg(short, long)]
        suffix: Vec<String>,
    },
    /// Open the newest primary dataset
    Latest,
    /// Create a blank dataset for a forecast time
    Create {
        /// Forecast time as YYYYMMDDHH
        time: String,
        /// Forecast horizon in hours (multiple of 3)
        #[arg(long)]
        hours: Option<u32>,
    },
    /// Open a dataset and describe its layout
    Info {
        /// Forecast time as YYYYMMDDHH
        time: String,
        /// Validate against the configured horizon instead of deriving it
        #[arg(long)]
        fixed: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => PredictorConfig::load(path)?,
        None => PredictorConfig::default(),
    }
    .with_env_overrides();

    match args.command {
        Command::List { suffix } => {
            let directory = args.dir.unwrap_or_else(|| config.dataset_directory.clone());
            let suffixes: Vec<&str> = suffix.iter().map(String::as_str).collect();
            let filter = (!suffixes.is_empty()).then_some(suffixes.as_slice());

            let mut entries: Vec<_> = scan(&directory, filter)?.collect();
            entries.sort();
            for entry in &entries {
                println!("{}  {:<12}  {}", entry.forecast_time, entry.suffix, entry.path.display());
            }
            println!("{} file(s) in {}", entries.len(), directory.display());
        }
        Command::Latest => {
            let directory = args.dir.unwrap_or_else(|| config.dataset_directory.clone());
            let newest = find_latest(&directory)?;
            info!("Newest dataset is {}", newest.filename);

            let dataset = config.cache().latest(&directory, true)?;
            describe(&dataset)?;
        }
        Command::Create { time, hours } => {
            let directory = args.dir.unwrap_or_else(|| config.output_directory.clone());
            let forecast_time = parse_time(&time)?;
            let layout = GridLayout::new(hours.unwrap_or(config.forecast_hours))?;

            let dataset = Dataset::create(&forecast_time, &directory, layout)?;
            dataset.flush()?;
            describe(&dataset)?;
        }
        Command::Info { time, fixed } => {
            let directory = args.dir.unwrap_or_else(|| config.dataset_directory.clone());
            let forecast_time = parse_time(&time)?;
            let mut options = config.open_options()?;
            if fixed {
                options = options.derive_horizon(false);
            }

            let dataset = options.open(&forecast_time, &directory)?;
            describe(&dataset)?;
        }
    }

    Ok(())
}

fn parse_time(time: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(time)
        .ok_or_else(|| DatasetError::Config(format!("'{time}' is not a YYYYMMDDHH timestamp")))
}

fn describe(dataset: &Dataset) -> Result<()> {
    let layout = dataset.layout();
    println!("Forecast time:   {}", dataset.forecast_time());
    println!("Path:            {}", dataset.path().display());
    println!("Forecast hours:  {}", dataset.forecast_hours());
    println!("Shape:           {:?}", layout.shape());
    println!("Size:            {} bytes", dataset.as_bytes()?.len());
    println!("Writable:        {}", dataset.is_writable());
    Ok(())
}
