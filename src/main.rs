//! CLI entry point for the éCO2mix grid-data toolkit.
//!
//! Provides subcommands for downloading daily exports from the RTE
//! portal, aggregating them into one long 15-minute series, surveying
//! format drift across files, and plotting the classic analyses.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use eco2mix::aggregate::{Aggregator, DEFAULT_PLACEHOLDER};
use eco2mix::analysis::charts::{self, MIX_STACKING};
use eco2mix::analysis::records::{running_records, weekly_stats};
use eco2mix::analysis::{
    BAD_READING_MW, SAMPLES_PER_DAY, averages::running_mean, duration::yearly_duration_curves,
    utility,
};
use eco2mix::columns::ColumnOrder;
use eco2mix::fetch::{BasicClient, DEFAULT_PORTAL_URL, download_range};
use eco2mix::series::Series;
use eco2mix::survey::survey_dir;
use std::ffi::OsStr;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "eco2mix")]
#[command(about = "Download, aggregate and analyze RTE éCO2mix grid data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily export files from the RTE portal
    Download {
        /// First day to fetch (inclusive)
        #[arg(short, long, default_value = "2000-06-24")]
        start: NaiveDate,

        /// Day to stop at (exclusive; defaults to today)
        #[arg(short = 'e', long)]
        stop: Option<NaiveDate>,

        /// Directory the daily files are stored in
        #[arg(short, long, default_value = "RTE_eCO2mix_daily")]
        data_dir: PathBuf,
    },
    /// Aggregate daily files into one homogenous 15-minute series
    Aggregate {
        /// First day to aggregate (inclusive)
        #[arg(short, long)]
        start: NaiveDate,

        /// Day to stop at (exclusive)
        #[arg(short = 'e', long)]
        stop: NaiveDate,

        /// Directory holding the daily files
        #[arg(short, long, default_value = "RTE_eCO2mix_daily")]
        data_dir: PathBuf,

        /// Output CSV (defaults to RTE_eCO2mix_<start>_<stop>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON array file overriding the canonical column order
        #[arg(short, long)]
        columns: Option<PathBuf>,

        /// Token written for missing values
        #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
        placeholder: String,
    },
    /// Survey format drift across downloaded daily files
    Survey {
        /// Directory holding the daily files
        #[arg(short, long, default_value = "RTE_eCO2mix_daily")]
        data_dir: PathBuf,

        /// Also write the report as JSON to this path
        #[arg(short, long)]
        json: Option<PathBuf>,
    },
    /// Plot weekly consumption with peak-demand records
    PlotConsumption {
        /// Aggregated series CSV to read
        input: PathBuf,

        /// PNG file to write
        #[arg(short, long, default_value = "consumption.png")]
        output: PathBuf,

        /// Record detection floor, in GW
        #[arg(short, long, default_value_t = 70.0)]
        floor: f64,
    },
    /// Plot per-year load-duration curves
    PlotLoadDuration {
        /// Aggregated series CSV to read
        input: PathBuf,

        /// PNG file to write
        #[arg(short, long, default_value = "load_duration.png")]
        output: PathBuf,
    },
    /// Plot the stacked production mix
    PlotMix {
        /// Aggregated series CSV to read
        input: PathBuf,

        /// PNG file to write
        #[arg(short, long, default_value = "production_mix.png")]
        output: PathBuf,
    },
    /// Plot wind production with running averages
    PlotWind {
        /// Aggregated series CSV to read
        input: PathBuf,

        /// PNG file to write
        #[arg(short, long, default_value = "wind_power.png")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/eco2mix.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("eco2mix.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            start,
            stop,
            data_dir,
        } => {
            let stop = stop.unwrap_or_else(|| Local::now().date_naive());
            let url = std::env::var("ECO2MIX_URL")
                .unwrap_or_else(|_| DEFAULT_PORTAL_URL.to_string());
            info!(%start, %stop, url = %url, "downloading daily exports");

            let client = BasicClient::new();
            let fetched = download_range(&client, &url, start, stop, &data_dir).await?;
            info!(fetched, "download complete");
        }
        Commands::Aggregate {
            start,
            stop,
            data_dir,
            output,
            columns,
            placeholder,
        } => {
            run_aggregate(start, stop, &data_dir, output, columns, placeholder)?;
        }
        Commands::Survey { data_dir, json } => {
            run_survey(&data_dir, json.as_deref())?;
        }
        Commands::PlotConsumption {
            input,
            output,
            floor,
        } => {
            plot_consumption(&input, &output, floor)?;
        }
        Commands::PlotLoadDuration { input, output } => {
            plot_load_duration(&input, &output)?;
        }
        Commands::PlotMix { input, output } => {
            plot_mix(&input, &output)?;
        }
        Commands::PlotWind { input, output } => {
            plot_wind(&input, &output)?;
        }
    }

    Ok(())
}

fn run_aggregate(
    start: NaiveDate,
    stop: NaiveDate,
    data_dir: &Path,
    output: Option<PathBuf>,
    columns: Option<PathBuf>,
    placeholder: String,
) -> Result<()> {
    let columns = match columns {
        Some(path) => ColumnOrder::from_json_file(&path)?,
        None => ColumnOrder::rte_default(),
    };
    let out_path =
        output.unwrap_or_else(|| PathBuf::from(format!("RTE_eCO2mix_{start}_{stop}.csv")));

    info!(%start, %stop, output = %out_path.display(), "aggregating daily files");
    let aggregator = Aggregator::new(data_dir, columns, placeholder);
    let file = File::create(&out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);

    match aggregator.write_series(start, stop, &mut writer) {
        Ok(rows) => {
            info!(rows, output = %out_path.display(), "aggregation complete");
            Ok(())
        }
        Err(err) => {
            // The aggregate is write-once: no partial output survives.
            drop(writer);
            if let Err(remove_err) = fs::remove_file(&out_path) {
                warn!(error = %remove_err, "failed to remove partial output");
            }
            Err(err.into())
        }
    }
}

fn run_survey(data_dir: &Path, json: Option<&Path>) -> Result<()> {
    let report = survey_dir(data_dir)?;

    info!(
        files = report.file_count,
        skipped = report.skipped,
        first = report.first_file.as_deref().unwrap_or("-"),
        last = report.last_file.as_deref().unwrap_or("-"),
        "survey finished"
    );
    for point in &report.status_changes {
        info!(file = %point.file, status = %point.value, "data-status change");
    }
    for point in &report.header_changes {
        info!(file = %point.file, header = %point.value, "header change");
    }
    info!(labels = report.labels.join(", "), "labels seen");
    for point in &report.availability_changes {
        info!(file = %point.file, available = %point.value, "availability change");
    }

    if let Some(path) = json {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!(report = %path.display(), "JSON report written");
    }
    Ok(())
}

/// Loads the consumption column in GW, with the known-bad readings masked.
fn consumption_gw(series: &Series) -> Result<Vec<f64>> {
    let mut consumption = series.column_scaled("Consommation", 1.0)?;
    utility::mask_value(&mut consumption, BAD_READING_MW);
    for v in &mut consumption {
        *v *= 1e-3;
    }
    Ok(consumption)
}

fn plot_consumption(input: &Path, output: &Path, floor_gw: f64) -> Result<()> {
    let series = Series::from_csv(input, DEFAULT_PLACEHOLDER)?;
    anyhow::ensure!(!series.is_empty(), "{} holds no rows", input.display());
    let consumption = consumption_gw(&series)?;

    // Records at least 6 hours apart.
    let records = running_records(&consumption, floor_gw, 6 * 4);
    info!(floor_gw, count = records.len(), "consumption records");
    for record in &records {
        let stamp = series.timestamps[record.index];
        info!(
            day = %stamp.date(),
            weekday = %stamp.format("%a"),
            time = %stamp.format("%H:%M"),
            power_gw = record.value,
            "consumption record"
        );
    }

    let weekly = weekly_stats(&consumption, 7 * SAMPLES_PER_DAY);
    let week_days: Vec<f64> = (0..weekly.avg.len())
        .map(|week| (week as f64 + 0.5) * 7.0)
        .collect();
    let record_points: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.index as f64 / SAMPLES_PER_DAY as f64, r.value))
        .collect();

    charts::consumption_chart(output, &week_days, &weekly, &record_points)?;
    info!(chart = %output.display(), "chart written");
    Ok(())
}

fn plot_load_duration(input: &Path, output: &Path) -> Result<()> {
    let series = Series::from_csv(input, DEFAULT_PLACEHOLDER)?;
    anyhow::ensure!(!series.is_empty(), "{} holds no rows", input.display());
    let consumption = consumption_gw(&series)?;

    let curves = yearly_duration_curves(&series.timestamps, &consumption);
    for curve in &curves {
        info!(
            year = curve.year,
            days = curve.sorted.len() / SAMPLES_PER_DAY,
            missing = curve.missing,
            "load duration curve"
        );
    }

    charts::load_duration_chart(output, &curves)?;
    info!(chart = %output.display(), "chart written");
    Ok(())
}

fn plot_mix(input: &Path, output: &Path) -> Result<()> {
    let series = Series::from_csv(input, DEFAULT_PLACEHOLDER)?;
    anyhow::ensure!(!series.is_empty(), "{} holds no rows", input.display());

    let days: Vec<f64> = (0..series.len())
        .map(|i| i as f64 / SAMPLES_PER_DAY as f64)
        .collect();

    // Cumulative top of each layer, in stacking order.
    let mut cumulative = vec![0.0f64; series.len()];
    let mut layers = Vec::with_capacity(MIX_STACKING.len());
    for (label, color) in MIX_STACKING {
        let column = series
            .column_scaled(label, 1e-3)
            .with_context(|| format!("production mix needs column {label:?}"))?;
        for (acc, value) in cumulative.iter_mut().zip(&column) {
            if !value.is_nan() {
                *acc += value;
            }
        }
        layers.push((label, color, cumulative.clone()));
    }

    charts::production_mix_chart(output, &days, &layers)?;
    info!(chart = %output.display(), "chart written");
    Ok(())
}

fn plot_wind(input: &Path, output: &Path) -> Result<()> {
    let series = Series::from_csv(input, DEFAULT_PLACEHOLDER)?;
    anyhow::ensure!(!series.is_empty(), "{} holds no rows", input.display());

    let wind = series.column_scaled("Eolien", 1e-3)?;
    info!(mean_gw = utility::mean(&wind), "average wind power");

    // Missing samples count as zero production in the averages.
    let filled: Vec<f64> = wind
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { *v })
        .collect();
    let day1 = running_mean(&filled, SAMPLES_PER_DAY);
    let day7 = running_mean(&filled, 7 * SAMPLES_PER_DAY);
    let day30 = running_mean(&filled, 30 * SAMPLES_PER_DAY);

    let days: Vec<f64> = (0..series.len())
        .map(|i| i as f64 / SAMPLES_PER_DAY as f64)
        .collect();

    charts::wind_chart(output, &days, &filled, &day1, &day7, &day30)?;
    info!(chart = %output.display(), "chart written");
    Ok(())
}
