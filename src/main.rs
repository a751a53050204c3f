use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod batch;
mod config;
mod decision;
mod enrich;
mod models;
mod normalize;
mod oracle;
mod pipeline;
mod query;
mod quota;
mod retrieval;
mod retry;
mod youtube;

use config::{AppConfig, CliConfig, FileConfig};
use models::{MatchStatus, RawRecord, SoundtrackRecord};
use oracle::GeminiOracle;
use pipeline::{Linker, LinkerServices};
use youtube::YouTubeClient;

#[derive(Parser, Debug)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
struct CliArgs {
    /// Path to a JSON array of soundtrack records to resolve.
    #[arg(long)]
    input: PathBuf,

    /// Path the JSON array of match results is written to.
    #[arg(long)]
    output: PathBuf,

    /// Optional TOML config file; its values override CLI flags.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum confidence for a candidate to count as resolved.
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of records processed concurrently.
    #[arg(long)]
    workers: Option<usize>,

    /// Abort records still running after this many seconds.
    #[arg(long)]
    batch_timeout_secs: Option<u64>,

    /// Skip comment fetching entirely.
    #[arg(long)]
    no_comments: bool,

    /// Search results requested per query.
    #[arg(long)]
    max_results: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;

    let cli_config = CliConfig {
        threshold: cli_args.threshold,
        workers: cli_args.workers,
        batch_timeout_secs: cli_args.batch_timeout_secs,
        no_comments: cli_args.no_comments,
        max_results: cli_args.max_results,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    let records = load_records(&cli_args.input)?;
    info!(
        record_count = records.len(),
        workers = app_config.settings.workers,
        threshold = app_config.settings.confidence_threshold,
        comments = app_config.settings.fetch_comments,
        model = %app_config.gemini_model,
        "configuration resolved"
    );

    let youtube = Arc::new(
        YouTubeClient::new(
            app_config.youtube_api_key.clone(),
            app_config.settings.request_timeout,
        )
        .map_err(|e| anyhow::anyhow!("failed to build YouTube client: {}", e))?,
    );
    let oracle = Arc::new(
        GeminiOracle::new(
            app_config.gemini_api_key.clone(),
            app_config.gemini_model.clone(),
            app_config.settings.request_timeout,
        )
        .map_err(|e| anyhow::anyhow!("failed to build Gemini client: {}", e))?,
    );

    let services = LinkerServices {
        search: youtube.clone(),
        details: youtube.clone(),
        comments: youtube,
        oracle,
    };
    let linker = Arc::new(Linker::new(services, app_config.settings));

    let progress = ProgressBar::new(records.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} records ({eta})")
            .expect("valid progress template"),
    );

    let results = batch::run_batch(linker, records, Some(progress.clone())).await;
    progress.finish_and_clear();

    let resolved = count_status(&results, MatchStatus::Resolved);
    info!(
        resolved,
        no_match = count_status(&results, MatchStatus::NoMatch),
        failed = count_status(&results, MatchStatus::Failed),
        timed_out = count_status(&results, MatchStatus::TimedOut),
        "batch finished"
    );

    let json = serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
    std::fs::write(&cli_args.output, json)
        .with_context(|| format!("Failed to write results to {:?}", cli_args.output))?;
    info!(output = ?cli_args.output, "results written");

    Ok(())
}

/// Read and normalize the input records. Any invalid record aborts the run
/// here, before batch work begins.
fn load_records(path: &PathBuf) -> Result<Vec<SoundtrackRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {:?}", path))?;
    let raw: Vec<RawRecord> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;

    let mut records = Vec::with_capacity(raw.len());
    for (index, raw_record) in raw.iter().enumerate() {
        match normalize::normalize_record(raw_record) {
            Ok(record) => records.push(record),
            Err(e) => bail!("record {} is invalid: {}", index, e),
        }
    }
    if records.is_empty() {
        bail!("input file {:?} contains no records", path);
    }
    Ok(records)
}

fn count_status(results: &[models::MatchResult], status: MatchStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}
