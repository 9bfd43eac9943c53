//! Classified PNG frames from product rasters.
//!
//! Loads a render job definition, renders every matching raster in the
//! input directory on a bounded worker pool and reports how many frames
//! were written and how many failed.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use renderer::{discover_sources, RenderConfig, RenderPool};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(name = "frame-renderer")]
#[command(about = "Render classified frames of product rasters")]
struct Args {
    /// Render job definition (YAML)
    #[arg(short, long, env = "FRAME_RENDERER_CONFIG")]
    config: PathBuf,

    /// Override the input raster directory
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Override the output frame directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the label font
    #[arg(long)]
    font: Option<PathBuf>,

    /// Worker threads (default: available parallelism)
    #[arg(short, long, env = "FRAME_RENDERER_WORKERS")]
    workers: Option<usize>,

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

    let mut config = RenderConfig::load(&args.config)?;
    if let Some(dir) = args.input_dir {
        config.inputs.dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(font) = args.font {
        config.label.font = Some(font);
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    config.validate()?;

    let renderer = config.build_renderer()?;
    let sources = discover_sources(&config.inputs.dir, &config.inputs.prefix, &config.inputs.suffix)
        .with_context(|| format!("Failed to list input directory {:?}", config.inputs.dir))?;

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", config.output_dir))?;

    let pool = RenderPool::new(config.workers).context("Failed to start worker pool")?;
    info!(
        render = %config.render.id,
        input_dir = %config.inputs.dir.display(),
        output_dir = %config.output_dir.display(),
        sources = sources.len(),
        workers = pool.workers(),
        "Generating frames"
    );

    let summary = pool.run(&renderer, &sources, &config.output_dir);
    for failed in &summary.failed {
        error!(file = %failed.file, reason = %failed.reason, "Frame not written");
    }

    info!(
        rendered = summary.rendered.len(),
        failed = summary.failed.len(),
        "Done"
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
