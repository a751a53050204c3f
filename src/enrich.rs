//! Candidate enrichment.
//!
//! Attaches view/like counts, the full description and optionally the top
//! comments to each retained candidate. Enrichment failures are strictly
//! non-fatal: the candidate is kept with whatever was obtained and flagged
//! `degraded`. Candidates are never dropped here.

use crate::models::VideoCandidate;
use crate::quota::{QuotaTracker, LOOKUP_COST};
use crate::youtube::{CommentOutcome, CommentService, VideoDetailService};
use tracing::{debug, warn};

/// Enrichment knobs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct EnricherConfig {
    /// When false, `comments` stays empty on every candidate. This is a
    /// configuration outcome, not an error.
    pub fetch_comments: bool,
    pub max_comments_per_video: u32,
}

/// Enrich all candidates in place.
pub async fn enrich_candidates(
    details: &dyn VideoDetailService,
    comments: &dyn CommentService,
    quota: &QuotaTracker,
    config: &EnricherConfig,
    candidates: &mut [VideoCandidate],
) {
    if candidates.is_empty() {
        return;
    }

    attach_details(details, quota, candidates).await;

    if config.fetch_comments {
        attach_comments(comments, quota, config.max_comments_per_video, candidates).await;
    }
}

/// One batched detail call for the whole candidate set. Ids missing from
/// the response leave their candidate degraded; a wholesale failure
/// degrades every candidate.
async fn attach_details(
    details: &dyn VideoDetailService,
    quota: &QuotaTracker,
    candidates: &mut [VideoCandidate],
) {
    if !quota.try_acquire(LOOKUP_COST) {
        warn!("skipping detail fetch, quota exhausted");
        for candidate in candidates.iter_mut() {
            candidate.degraded = true;
        }
        return;
    }

    let ids: Vec<String> = candidates.iter().map(|c| c.video_id.clone()).collect();
    match details.details(&ids).await {
        Ok(map) => {
            for candidate in candidates.iter_mut() {
                match map.get(&candidate.video_id) {
                    Some(detail) => {
                        candidate.view_count = detail.view_count;
                        candidate.like_count = detail.like_count;
                        candidate.description = detail.description.clone();
                    }
                    None => {
                        debug!(video_id = %candidate.video_id, "no details returned for video");
                        candidate.degraded = true;
                    }
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "detail fetch failed, keeping candidates degraded");
            for candidate in candidates.iter_mut() {
                candidate.degraded = true;
            }
        }
    }
}

async fn attach_comments(
    comments: &dyn CommentService,
    quota: &QuotaTracker,
    max_comments: u32,
    candidates: &mut [VideoCandidate],
) {
    for candidate in candidates.iter_mut() {
        if !quota.try_acquire(LOOKUP_COST) {
            warn!(video_id = %candidate.video_id, "skipping comment fetch, quota exhausted");
            candidate.degraded = true;
            continue;
        }

        match comments.comments(&candidate.video_id, max_comments).await {
            Ok(CommentOutcome::Comments(texts)) => {
                candidate.comments = texts;
            }
            Ok(CommentOutcome::Disabled) => {
                // Normal state for the video, not a degradation.
                candidate.comments = Vec::new();
            }
            Err(e) => {
                warn!(video_id = %candidate.video_id, error = %e, "comment fetch failed");
                candidate.degraded = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{watch_url, SearchHit, VideoDetails};
    use crate::youtube::SearchError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticDetails {
        map: HashMap<String, VideoDetails>,
        fail: bool,
    }

    #[async_trait]
    impl VideoDetailService for StaticDetails {
        async fn details(
            &self,
            _video_ids: &[String],
        ) -> Result<HashMap<String, VideoDetails>, SearchError> {
            if self.fail {
                return Err(SearchError::Timeout);
            }
            Ok(self.map.clone())
        }
    }

    enum CommentBehavior {
        Fixed(Vec<String>),
        Disabled,
        Fail,
    }

    struct StaticComments(CommentBehavior);

    #[async_trait]
    impl CommentService for StaticComments {
        async fn comments(
            &self,
            _video_id: &str,
            _max_comments: u32,
        ) -> Result<CommentOutcome, SearchError> {
            match &self.0 {
                CommentBehavior::Fixed(texts) => Ok(CommentOutcome::Comments(texts.clone())),
                CommentBehavior::Disabled => Ok(CommentOutcome::Disabled),
                CommentBehavior::Fail => Err(SearchError::Connection("reset".to_string())),
            }
        }
    }

    fn candidate(id: &str) -> VideoCandidate {
        VideoCandidate::from_hit(SearchHit {
            video_id: id.to_string(),
            title: format!("Video {}", id),
            channel_name: "Channel".to_string(),
            url: watch_url(id),
            thumbnail_url: None,
        })
    }

    fn details_for(id: &str, views: u64) -> (String, VideoDetails) {
        (
            id.to_string(),
            VideoDetails {
                view_count: views,
                like_count: Some(views / 100),
                description: Some(format!("Description of {}", id)),
            },
        )
    }

    fn config(fetch_comments: bool) -> EnricherConfig {
        EnricherConfig {
            fetch_comments,
            max_comments_per_video: 20,
        }
    }

    #[tokio::test]
    async fn test_details_applied() {
        let details = StaticDetails {
            map: [details_for("V1", 5000)].into_iter().collect(),
            fail: false,
        };
        let comments = StaticComments(CommentBehavior::Fixed(vec!["great".to_string()]));
        let quota = QuotaTracker::new(None);
        let mut candidates = vec![candidate("V1")];

        enrich_candidates(&details, &comments, &quota, &config(true), &mut candidates).await;

        assert_eq!(candidates[0].view_count, 5000);
        assert_eq!(candidates[0].like_count, Some(50));
        assert_eq!(candidates[0].comments, vec!["great"]);
        assert!(!candidates[0].degraded);
    }

    #[tokio::test]
    async fn test_missing_id_degrades_only_that_candidate() {
        let details = StaticDetails {
            map: [details_for("V1", 5000)].into_iter().collect(),
            fail: false,
        };
        let comments = StaticComments(CommentBehavior::Fixed(Vec::new()));
        let quota = QuotaTracker::new(None);
        let mut candidates = vec![candidate("V1"), candidate("V2")];

        enrich_candidates(&details, &comments, &quota, &config(false), &mut candidates).await;

        assert!(!candidates[0].degraded);
        assert!(candidates[1].degraded);
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_all_candidates() {
        let details = StaticDetails {
            map: HashMap::new(),
            fail: true,
        };
        let comments = StaticComments(CommentBehavior::Fixed(Vec::new()));
        let quota = QuotaTracker::new(None);
        let mut candidates = vec![candidate("V1"), candidate("V2")];

        enrich_candidates(&details, &comments, &quota, &config(false), &mut candidates).await;

        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.degraded));
    }

    #[tokio::test]
    async fn test_comments_disabled_config_yields_empty() {
        let details = StaticDetails {
            map: [details_for("V1", 10)].into_iter().collect(),
            fail: false,
        };
        // Would fail if called; fetch_comments=false must never call it.
        let comments = StaticComments(CommentBehavior::Fail);
        let quota = QuotaTracker::new(None);
        let mut candidates = vec![candidate("V1")];

        enrich_candidates(&details, &comments, &quota, &config(false), &mut candidates).await;

        assert!(candidates[0].comments.is_empty());
        assert!(!candidates[0].degraded);
    }

    #[tokio::test]
    async fn test_comments_disabled_on_video_is_not_degradation() {
        let details = StaticDetails {
            map: [details_for("V1", 10)].into_iter().collect(),
            fail: false,
        };
        let comments = StaticComments(CommentBehavior::Disabled);
        let quota = QuotaTracker::new(None);
        let mut candidates = vec![candidate("V1")];

        enrich_candidates(&details, &comments, &quota, &config(true), &mut candidates).await;

        assert!(candidates[0].comments.is_empty());
        assert!(!candidates[0].degraded);
    }

    #[tokio::test]
    async fn test_comment_failure_degrades_but_keeps_candidate() {
        let details = StaticDetails {
            map: [details_for("V1", 10)].into_iter().collect(),
            fail: false,
        };
        let comments = StaticComments(CommentBehavior::Fail);
        let quota = QuotaTracker::new(None);
        let mut candidates = vec![candidate("V1")];

        enrich_candidates(&details, &comments, &quota, &config(true), &mut candidates).await;

        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].degraded);
        assert_eq!(candidates[0].view_count, 10);
    }
}
