//! Per-county time series from satellite product rasters.
//!
//! Loads a product definition, aggregates every value/quality layer pair
//! in the input directory over every boundary region and writes the table
//! as CSV.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use aggregation::{write_csv, ProductConfig, TemporalAggregationPipeline};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(name = "aggregator")]
#[command(about = "Aggregate quality-filtered product rasters per boundary region")]
struct Args {
    /// Product definition (YAML)
    #[arg(short, long, env = "AGGREGATOR_CONFIG")]
    config: PathBuf,

    /// Override the input layer directory
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Override the boundary GeoJSON
    #[arg(long)]
    boundary: Option<PathBuf>,

    /// Override the quality lookup table
    #[arg(long)]
    quality_table: Option<PathBuf>,

    /// Override the output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads (default: one per CPU)
    #[arg(long, env = "AGGREGATOR_THREADS")]
    threads: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let start = Instant::now();
    let mut config = ProductConfig::load(&args.config)?;
    if let Some(dir) = args.input_dir {
        config.inputs.dir = dir;
    }
    if let Some(boundary) = args.boundary {
        config.inputs.boundary = boundary;
    }
    if let Some(table) = args.quality_table {
        config.inputs.quality_table = table;
    }
    if let Some(output) = args.output {
        config.output = output;
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    info!(
        product = %config.product.id,
        input_dir = %config.inputs.dir.display(),
        boundary = %config.inputs.boundary.display(),
        output = %config.output.display(),
        threads = rayon::current_num_threads(),
        "Starting aggregation"
    );

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    let output = config.output.clone();
    let pipeline = TemporalAggregationPipeline::new(config);
    let result = pipeline.run()?;
    write_csv(&output, &result.records)?;

    info!(
        output = %output.display(),
        files = result.summary.files_seen,
        regions = result.summary.regions,
        rows = result.summary.rows_emitted,
        imputed = result.summary.rows_imputed,
        missing = result.summary.rows_missing,
        skipped = result.summary.skipped.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Wrote time series"
    );

    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}
