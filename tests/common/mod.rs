//! Common test infrastructure
//!
//! In-process fakes for the external video and oracle services, plus
//! fixture builders. Tests wire these into a `Linker` instead of talking
//! to the real APIs.

use async_trait::async_trait;
use soundtrack_linker::models::{watch_url, SearchHit, VideoDetails};
use soundtrack_linker::oracle::{MatchOracle, OracleError, OracleVerdict};
use soundtrack_linker::pipeline::{Linker, LinkerServices};
use soundtrack_linker::youtube::{
    CommentOutcome, CommentService, SearchError, VideoDetailService, VideoSearchService,
};
use soundtrack_linker::{LinkerSettings, SoundtrackRecord};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Fixtures
// =============================================================================

pub fn titanic_record() -> SoundtrackRecord {
    SoundtrackRecord {
        title: "My Heart Will Go On".to_string(),
        performer: Some("Céline Dion".to_string()),
        composer: Some("James Horner".to_string()),
        lyricist: Some("Will Jennings".to_string()),
        movie_title: Some("Titanic".to_string()),
    }
}

pub fn hit(id: &str, title: &str, channel: &str) -> SearchHit {
    SearchHit {
        video_id: id.to_string(),
        title: title.to_string(),
        channel_name: channel.to_string(),
        url: watch_url(id),
        thumbnail_url: None,
    }
}

pub fn details(views: u64, likes: u64, description: &str) -> VideoDetails {
    VideoDetails {
        view_count: views,
        like_count: Some(likes),
        description: Some(description.to_string()),
    }
}

/// Settings tuned for fast tests: single query tier retries are instant.
pub fn fast_settings() -> LinkerSettings {
    let mut settings = LinkerSettings::default();
    settings.retry.initial_backoff_ms = 1;
    settings.retry.max_backoff_ms = 2;
    settings.retry.max_attempts = 2;
    settings
}

pub fn make_linker(
    search: Arc<dyn VideoSearchService>,
    details: Arc<dyn VideoDetailService>,
    comments: Arc<dyn CommentService>,
    oracle: Arc<dyn MatchOracle>,
    settings: LinkerSettings,
) -> Linker {
    Linker::new(
        LinkerServices {
            search,
            details,
            comments,
            oracle,
        },
        settings,
    )
}

// =============================================================================
// Search fakes
// =============================================================================

/// Returns the same hits for every query.
pub struct StaticSearch {
    pub hits: Vec<SearchHit>,
}

#[async_trait]
impl VideoSearchService for StaticSearch {
    async fn search(&self, _query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        Ok(self.hits.iter().take(max_results as usize).cloned().collect())
    }
}

/// Every search call times out.
pub struct FailingSearch;

#[async_trait]
impl VideoSearchService for FailingSearch {
    async fn search(&self, _query: &str, _max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        Err(SearchError::Timeout)
    }
}

// =============================================================================
// Detail / comment fakes
// =============================================================================

pub struct StaticDetails {
    pub map: HashMap<String, VideoDetails>,
}

#[async_trait]
impl VideoDetailService for StaticDetails {
    async fn details(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoDetails>, SearchError> {
        Ok(video_ids
            .iter()
            .filter_map(|id| self.map.get(id).map(|d| (id.clone(), d.clone())))
            .collect())
    }
}

pub struct StaticComments {
    pub comments: Vec<String>,
}

#[async_trait]
impl CommentService for StaticComments {
    async fn comments(
        &self,
        _video_id: &str,
        max_comments: u32,
    ) -> Result<CommentOutcome, SearchError> {
        Ok(CommentOutcome::Comments(
            self.comments
                .iter()
                .take(max_comments as usize)
                .cloned()
                .collect(),
        ))
    }
}

/// Comment service that must never be called; panics if it is.
pub struct UnreachableComments;

#[async_trait]
impl CommentService for UnreachableComments {
    async fn comments(
        &self,
        video_id: &str,
        _max_comments: u32,
    ) -> Result<CommentOutcome, SearchError> {
        panic!("comment service called for {} with comments disabled", video_id);
    }
}

// =============================================================================
// Oracle fakes
// =============================================================================

/// Always returns the same verdict.
pub struct FixedOracle {
    pub selected_index: Option<usize>,
    pub confidence: f64,
}

#[async_trait]
impl MatchOracle for FixedOracle {
    async fn adjudicate(
        &self,
        _record: &SoundtrackRecord,
        _candidates: &[soundtrack_linker::VideoCandidate],
    ) -> Result<OracleVerdict, OracleError> {
        Ok(OracleVerdict {
            selected_index: self.selected_index,
            confidence: self.confidence,
            reasoning: "fixture verdict".to_string(),
            key_factors: vec!["official channel".to_string()],
            concerns: vec![],
        })
    }
}

/// Oracle that is always unreachable.
pub struct DownOracle;

#[async_trait]
impl MatchOracle for DownOracle {
    async fn adjudicate(
        &self,
        _record: &SoundtrackRecord,
        _candidates: &[soundtrack_linker::VideoCandidate],
    ) -> Result<OracleVerdict, OracleError> {
        Err(OracleError::Connection("oracle unreachable".to_string()))
    }
}

/// Oracle with a per-record-title delay before answering, for exercising
/// completion order and deadlines.
pub struct SlowOracle {
    pub delays: HashMap<String, Duration>,
    pub inner: FixedOracle,
}

#[async_trait]
impl MatchOracle for SlowOracle {
    async fn adjudicate(
        &self,
        record: &SoundtrackRecord,
        candidates: &[soundtrack_linker::VideoCandidate],
    ) -> Result<OracleVerdict, OracleError> {
        if let Some(delay) = self.delays.get(&record.title) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.adjudicate(record, candidates).await
    }
}

/// Oracle that panics for one specific record title.
pub struct PanickyOracle {
    pub panic_on_title: String,
    pub inner: FixedOracle,
}

#[async_trait]
impl MatchOracle for PanickyOracle {
    async fn adjudicate(
        &self,
        record: &SoundtrackRecord,
        candidates: &[soundtrack_linker::VideoCandidate],
    ) -> Result<OracleVerdict, OracleError> {
        if record.title == self.panic_on_title {
            panic!("oracle fixture panic for {}", record.title);
        }
        self.inner.adjudicate(record, candidates).await
    }
}
