//! Candidate retrieval.
//!
//! Walks the planned query sequence, most specific first, accumulating
//! deduplicated candidates until the quota is met or the queries run out.
//! A failed query never aborts retrieval for the record; the retriever logs
//! it and moves on to the next relaxation tier.

use crate::models::VideoCandidate;
use crate::quota::{QuotaTracker, SEARCH_COST};
use crate::retry::RetryPolicy;
use crate::youtube::{SearchError, VideoSearchService};
use std::collections::HashSet;
use tracing::{info, warn};

/// Retrieval knobs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Result count requested per search call.
    pub max_results_per_query: u32,
    /// Stop issuing further queries once this many candidates are held.
    pub candidate_quota: usize,
}

/// What retrieval produced for one record.
#[derive(Debug)]
pub struct RetrievalOutcome {
    /// Deduplicated candidates, first-seen (most specific query) instance
    /// kept for each video id.
    pub candidates: Vec<VideoCandidate>,
    /// Queries actually issued, in order.
    pub queries_issued: Vec<String>,
    /// True when a non-empty query plan produced no successful query, either
    /// because every issued query failed after retries or because the quota
    /// latch prevented issuing any. Zero candidates from successful queries
    /// is "no results", not a failure.
    pub all_queries_failed: bool,
}

/// Run the query sequence against the search service.
pub async fn retrieve_candidates(
    search: &dyn VideoSearchService,
    quota: &QuotaTracker,
    retry: &RetryPolicy,
    queries: &[String],
    config: &RetrieverConfig,
) -> RetrievalOutcome {
    let mut candidates: Vec<VideoCandidate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut queries_issued = Vec::new();
    let mut any_success = false;

    for query in queries {
        if candidates.len() >= config.candidate_quota {
            break;
        }
        if quota.is_exhausted() {
            warn!(query, "skipping remaining queries, quota exhausted");
            break;
        }

        queries_issued.push(query.clone());

        match search_with_retry(search, quota, retry, query, config.max_results_per_query).await {
            Ok(hits) => {
                any_success = true;
                let before = candidates.len();
                for hit in hits {
                    if seen.insert(hit.video_id.clone()) {
                        candidates.push(VideoCandidate::from_hit(hit));
                    }
                }
                info!(
                    query,
                    new = candidates.len() - before,
                    total = candidates.len(),
                    "search query completed"
                );
            }
            Err(e) => {
                warn!(query, error = %e, "search query failed after retries");
                if matches!(e, SearchError::QuotaExhausted) {
                    quota.mark_exhausted();
                }
            }
        }
    }

    RetrievalOutcome {
        all_queries_failed: !queries.is_empty() && !any_success,
        candidates,
        queries_issued,
    }
}

/// Issue a single search with bounded exponential-backoff retry on
/// transient failures.
async fn search_with_retry(
    search: &dyn VideoSearchService,
    quota: &QuotaTracker,
    retry: &RetryPolicy,
    query: &str,
    max_results: u32,
) -> Result<Vec<crate::models::SearchHit>, SearchError> {
    let mut attempt = 0;
    loop {
        if !quota.try_acquire(SEARCH_COST) {
            return Err(SearchError::QuotaExhausted);
        }

        match search.search(query, max_results).await {
            Ok(hits) => return Ok(hits),
            Err(e) if e.is_transient() && attempt + 1 < retry.max_attempts => {
                let delay = retry.delay(attempt);
                warn!(query, attempt, error = %e, ?delay, "transient search failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
