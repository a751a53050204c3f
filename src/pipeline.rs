//! Single-record linking pipeline.
//!
//! Plans queries, retrieves and enriches candidates, adjudicates the set
//! and applies the decision threshold. One `Linker` is built per batch run
//! and shared by all workers; the only mutable state it holds is the
//! shared quota tracker.

use crate::config::LinkerSettings;
use crate::decision::decide;
use crate::enrich::{enrich_candidates, EnricherConfig};
use crate::models::{MatchResult, SoundtrackRecord};
use crate::oracle::{adjudicate_with_fallback, MatchOracle};
use crate::query::plan_queries;
use crate::quota::QuotaTracker;
use crate::retrieval::{retrieve_candidates, RetrieverConfig};
use crate::youtube::{CommentService, VideoDetailService, VideoSearchService};
use std::sync::Arc;
use tracing::info;

/// External collaborators of the pipeline, injected so tests can swap in
/// in-process fakes.
#[derive(Clone)]
pub struct LinkerServices {
    pub search: Arc<dyn VideoSearchService>,
    pub details: Arc<dyn VideoDetailService>,
    pub comments: Arc<dyn CommentService>,
    pub oracle: Arc<dyn MatchOracle>,
}

/// The linking pipeline for one batch run.
pub struct Linker {
    services: LinkerServices,
    settings: LinkerSettings,
    quota: Arc<QuotaTracker>,
}

impl Linker {
    pub fn new(services: LinkerServices, settings: LinkerSettings) -> Self {
        let quota = Arc::new(QuotaTracker::new(settings.daily_quota_units));
        Self {
            services,
            settings,
            quota,
        }
    }

    pub fn settings(&self) -> &LinkerSettings {
        &self.settings
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    /// Resolve one record to its most likely video.
    ///
    /// Never fails: every outcome, including total retrieval failure, is
    /// encoded in the returned `MatchResult`.
    pub async fn find_match(&self, record: &SoundtrackRecord) -> MatchResult {
        let queries = plan_queries(record, self.settings.max_queries);
        info!(title = %record.title, query_count = queries.len(), "linking record");

        let retriever_config = RetrieverConfig {
            max_results_per_query: self.settings.max_results_per_query,
            candidate_quota: self.settings.candidate_quota,
        };
        let outcome = retrieve_candidates(
            self.services.search.as_ref(),
            &self.quota,
            &self.settings.retry,
            &queries,
            &retriever_config,
        )
        .await;

        if outcome.all_queries_failed {
            return MatchResult::failed(record.clone(), outcome.queries_issued);
        }

        let mut candidates = outcome.candidates;
        info!(
            title = %record.title,
            candidate_count = candidates.len(),
            "retrieval complete"
        );

        let enricher_config = EnricherConfig {
            fetch_comments: self.settings.fetch_comments,
            max_comments_per_video: self.settings.max_comments_per_video,
        };
        enrich_candidates(
            self.services.details.as_ref(),
            self.services.comments.as_ref(),
            &self.quota,
            &enricher_config,
            &mut candidates,
        )
        .await;

        let adjudication =
            adjudicate_with_fallback(self.services.oracle.as_ref(), record, &candidates).await;

        decide(
            record.clone(),
            outcome.queries_issued,
            candidates,
            adjudication,
            self.settings.confidence_threshold,
        )
    }
}
