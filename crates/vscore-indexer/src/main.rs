//! `vscore` command-line interface.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vscore_indexer::{ExtractorKind, IndexerConfig, VideoIndexer};
use vscore_models::{VideoIndex, METRIC_INFO};

#[derive(Parser, Debug)]
#[command(name = "vscore")]
#[command(about = "Per-segment visual quality and style index for video folders")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score every video in a folder and write the index as JSON
    Index {
        /// Folder containing the videos (not searched recursively)
        input_folder: PathBuf,

        /// Path of the JSON index to write
        output_file: PathBuf,

        /// Segment length in seconds
        #[arg(short = 'd', long, allow_negative_numbers = true)]
        segment_duration: Option<f64>,

        /// Maximum segments decoded and scored at once
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Downscale frames to this width before analysis
        #[arg(long)]
        analysis_width: Option<u32>,

        /// Vision backend
        #[arg(long, value_enum)]
        extractor: Option<ExtractorKind>,
    },

    /// List the persisted metrics
    Metrics,

    /// Print the JSON Schema of the index document
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    match Cli::parse().command {
        Command::Index {
            input_folder,
            output_file,
            segment_duration,
            max_parallel,
            analysis_width,
            extractor,
        } => {
            let mut config = IndexerConfig::from_env();
            if let Some(seconds) = segment_duration {
                config = config.with_segment_duration(seconds);
            }
            if let Some(max) = max_parallel {
                config = config.with_max_parallel(max);
            }
            if let Some(width) = analysis_width {
                config = config.with_analysis_width(width);
            }
            if let Some(kind) = extractor {
                config = config.with_extractor(kind);
            }
            run_index(config, input_folder, output_file).await
        }
        Command::Metrics => {
            print_metrics();
            Ok(())
        }
        Command::Schema => {
            let schema = schemars::schema_for!(VideoIndex);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

/// Colored output for interactive use, JSON when `LOG_FORMAT=json`.
fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vscore=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run_index(
    config: IndexerConfig,
    input_folder: PathBuf,
    output_file: PathBuf,
) -> Result<()> {
    info!(config = ?config, "Starting vscore indexer");

    // Rejects invalid configuration before any video is touched
    let indexer = VideoIndexer::new(config).context("Failed to create indexer")?;
    let index = indexer
        .run(&input_folder, &output_file)
        .await
        .with_context(|| format!("Indexing {} failed", input_folder.display()))?;

    println!(
        "Indexed {}/{} videos, {} segments -> {}",
        index.metadata.indexed_videos,
        index.metadata.total_videos,
        index.metadata.total_segments,
        output_file.display()
    );
    Ok(())
}

fn print_metrics() {
    let width = METRIC_INFO.iter().map(|m| m.name.len()).max().unwrap_or(0);
    println!("Available metrics ({}):", METRIC_INFO.len());
    for metric in METRIC_INFO {
        println!("  {:<width$}  {}", metric.name, metric.description, width = width);
    }
}
