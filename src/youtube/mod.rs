//! Video platform service abstractions.
//!
//! Trait-based seams over the external search, detail and comment services,
//! so the pipeline can run against the real YouTube Data API or against
//! in-process fakes in tests.

mod client;

pub use client::YouTubeClient;

use crate::models::{SearchHit, VideoDetails};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from the video search / detail / comment services.
///
/// Rate limiting and transient failures are distinct variants so the
/// retriever can tell them apart from "no results".
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timeout")]
    Timeout,

    #[error("rate limited")]
    RateLimited,

    #[error("API quota exhausted")]
    QuotaExhausted,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SearchError {
    /// Whether a retry of the same request can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SearchError::Connection(_) | SearchError::Timeout | SearchError::RateLimited
        )
    }
}

/// Outcome of a comment fetch. Comments being disabled on a video is a
/// normal state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentOutcome {
    Comments(Vec<String>),
    Disabled,
}

/// Plain-text video search.
#[async_trait]
pub trait VideoSearchService: Send + Sync {
    /// Search for videos matching `query`, returning at most `max_results`
    /// hits in relevance order. An empty vec means the query genuinely had
    /// no results.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError>;
}

/// Batched per-video statistics and description lookup.
#[async_trait]
pub trait VideoDetailService: Send + Sync {
    /// Fetch details for a set of video ids. Ids the service cannot resolve
    /// are simply absent from the returned map; only a wholesale failure is
    /// an error.
    async fn details(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoDetails>, SearchError>;
}

/// Top-level comment retrieval.
#[async_trait]
pub trait CommentService: Send + Sync {
    /// Fetch up to `max_comments` top comments for a video.
    async fn comments(
        &self,
        video_id: &str,
        max_comments: u32,
    ) -> Result<CommentOutcome, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SearchError::Timeout.is_transient());
        assert!(SearchError::RateLimited.is_transient());
        assert!(SearchError::Connection("reset".into()).is_transient());
        assert!(!SearchError::QuotaExhausted.is_transient());
        assert!(!SearchError::InvalidResponse("bad json".into()).is_transient());
        assert!(!SearchError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_transient());
    }
}
