//! Configuration resolution.
//!
//! CLI arguments, an optional TOML file and environment credentials are
//! merged into one validated `AppConfig`. TOML values override CLI values
//! where present; credentials resolve file > environment. Invalid settings
//! are fatal here, before any batch work begins.

mod file_config;

pub use file_config::{FileConfig, RetryConfig};

use crate::retry::RetryPolicy;
use anyhow::{bail, Result};
use std::time::Duration;

pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// CLI arguments that take part in config resolution; mirrors the clap
/// struct in `main.rs`.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub threshold: Option<f64>,
    pub workers: Option<usize>,
    pub batch_timeout_secs: Option<u64>,
    pub no_comments: bool,
    pub max_results: Option<u32>,
}

/// Pipeline settings consumed by the linker and batch orchestrator.
#[derive(Debug, Clone)]
pub struct LinkerSettings {
    pub max_queries: usize,
    pub max_results_per_query: u32,
    pub candidate_quota: usize,
    pub fetch_comments: bool,
    pub max_comments_per_video: u32,
    pub confidence_threshold: f64,
    pub workers: usize,
    pub batch_timeout: Option<Duration>,
    pub request_timeout: Duration,
    pub daily_quota_units: Option<u64>,
    pub retry: RetryPolicy,
}

impl Default for LinkerSettings {
    fn default() -> Self {
        Self {
            max_queries: crate::query::DEFAULT_MAX_QUERIES,
            max_results_per_query: 10,
            candidate_quota: 10,
            fetch_comments: true,
            max_comments_per_video: 20,
            confidence_threshold: 0.6,
            workers: 3,
            batch_timeout: None,
            request_timeout: Duration::from_secs(30),
            daily_quota_units: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub youtube_api_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub settings: LinkerSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config, with credentials falling back to the environment.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let youtube_api_key = file
            .youtube_api_key
            .or_else(|| std::env::var(YOUTUBE_API_KEY_ENV).ok())
            .filter(|k| !k.is_empty());
        let Some(youtube_api_key) = youtube_api_key else {
            bail!(
                "YouTube API key must be set in the config file or via {}",
                YOUTUBE_API_KEY_ENV
            );
        };

        let gemini_api_key = file
            .gemini_api_key
            .or_else(|| std::env::var(GEMINI_API_KEY_ENV).ok())
            .filter(|k| !k.is_empty());
        let Some(gemini_api_key) = gemini_api_key else {
            bail!(
                "Gemini API key must be set in the config file or via {}",
                GEMINI_API_KEY_ENV
            );
        };

        let defaults = LinkerSettings::default();

        let settings = LinkerSettings {
            max_queries: file.max_queries.unwrap_or(defaults.max_queries),
            max_results_per_query: file
                .max_results_per_query
                .or(cli.max_results)
                .unwrap_or(defaults.max_results_per_query),
            candidate_quota: file.candidate_quota.unwrap_or(defaults.candidate_quota),
            fetch_comments: file
                .fetch_comments
                .unwrap_or(!cli.no_comments),
            max_comments_per_video: file
                .max_comments_per_video
                .unwrap_or(defaults.max_comments_per_video),
            confidence_threshold: file
                .confidence_threshold
                .or(cli.threshold)
                .unwrap_or(defaults.confidence_threshold),
            workers: file.workers.or(cli.workers).unwrap_or(defaults.workers),
            batch_timeout: file
                .batch_timeout_secs
                .or(cli.batch_timeout_secs)
                .map(Duration::from_secs),
            request_timeout: file
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            daily_quota_units: file.daily_quota_units,
            retry: resolve_retry(file.retry),
        };

        if !(0.0..=1.0).contains(&settings.confidence_threshold) {
            bail!(
                "confidence_threshold must be within [0, 1], got {}",
                settings.confidence_threshold
            );
        }
        if settings.workers == 0 {
            bail!("workers must be at least 1");
        }
        if settings.max_queries == 0 {
            bail!("max_queries must be at least 1");
        }
        if settings.max_results_per_query == 0 || settings.max_results_per_query > 50 {
            bail!(
                "max_results_per_query must be within [1, 50], got {}",
                settings.max_results_per_query
            );
        }
        if settings.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }

        Ok(Self {
            youtube_api_key,
            gemini_api_key,
            gemini_model: file
                .gemini_model
                .unwrap_or_else(|| crate::oracle::DEFAULT_MODEL.to_string()),
            settings,
        })
    }
}

fn resolve_retry(file: Option<RetryConfig>) -> RetryPolicy {
    let file = file.unwrap_or_default();
    let defaults = RetryPolicy::default();
    RetryPolicy {
        max_attempts: file.max_attempts.unwrap_or(defaults.max_attempts),
        initial_backoff_ms: file.initial_backoff_ms.unwrap_or(defaults.initial_backoff_ms),
        max_backoff_ms: file.max_backoff_ms.unwrap_or(defaults.max_backoff_ms),
        backoff_multiplier: file.backoff_multiplier.unwrap_or(defaults.backoff_multiplier),
    }
}
