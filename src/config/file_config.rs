use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Credentials (can also come from the environment)
    pub youtube_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,

    // Pipeline settings (can override CLI)
    pub max_queries: Option<usize>,
    pub max_results_per_query: Option<u32>,
    pub candidate_quota: Option<usize>,
    pub fetch_comments: Option<bool>,
    pub max_comments_per_video: Option<u32>,
    pub confidence_threshold: Option<f64>,
    pub workers: Option<usize>,
    pub batch_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub daily_quota_units: Option<u64>,

    // Retry/backoff settings
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
