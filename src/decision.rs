//! Decision engine.
//!
//! Applies the confidence threshold to an adjudication and assembles the
//! final `MatchResult`. A low-confidence score is kept on the result for
//! diagnostics even when the record ends as `NoMatch`.

use crate::models::{MatchResult, MatchStatus, SoundtrackRecord, VideoCandidate};
use crate::oracle::Adjudication;
use chrono::Utc;
use tracing::{info, warn};

/// Break a tie among equally scored candidates: highest view count first,
/// then most complete metadata, then the earlier (more specific) position.
pub(crate) fn pick_preferred(candidates: &[VideoCandidate], tied: &[usize]) -> usize {
    debug_assert!(!tied.is_empty());
    let mut best = tied[0];
    for &i in &tied[1..] {
        let challenger = &candidates[i];
        let incumbent = &candidates[best];
        let by_views = challenger.view_count.cmp(&incumbent.view_count);
        let winner = by_views
            .then_with(|| completeness(challenger).cmp(&completeness(incumbent)))
            .is_gt();
        if winner {
            best = i;
        }
    }
    best
}

fn completeness(candidate: &VideoCandidate) -> u8 {
    candidate.description.is_some() as u8 + (!candidate.comments.is_empty()) as u8
}

/// Apply the threshold and build the record's final result.
///
/// `adjudication` is `None` only for an empty candidate set. A selected
/// index outside the candidate set is treated as no qualifying match, not
/// a panic, so callers may pass unvalidated adjudications.
pub fn decide(
    soundtrack: SoundtrackRecord,
    search_queries_used: Vec<String>,
    candidates: Vec<VideoCandidate>,
    adjudication: Option<Adjudication>,
    threshold: f64,
) -> MatchResult {
    let candidates_considered = candidates.len();

    let (best_match, match_score, status) = match adjudication {
        None => (None, None, MatchStatus::NoMatch),
        Some(adjudication) => {
            let mut score = adjudication.score;
            match adjudication.selected_index {
                Some(index) if score.confidence >= threshold => {
                    match candidates.into_iter().nth(index) {
                        Some(selected) => {
                            if selected.degraded {
                                score.concerns.push(
                                    "partial enrichment data for selected candidate".to_string(),
                                );
                            }
                            info!(
                                title = %soundtrack.title,
                                video_id = %selected.video_id,
                                confidence = score.confidence,
                                "record resolved"
                            );
                            (Some(selected), Some(score), MatchStatus::Resolved)
                        }
                        None => {
                            warn!(
                                title = %soundtrack.title,
                                index,
                                candidates_considered,
                                "selected index outside candidate set"
                            );
                            (None, Some(score), MatchStatus::NoMatch)
                        }
                    }
                }
                _ => {
                    info!(
                        title = %soundtrack.title,
                        confidence = score.confidence,
                        threshold,
                        selected = ?adjudication.selected_index,
                        "no qualifying match"
                    );
                    (None, Some(score), MatchStatus::NoMatch)
                }
            }
        }
    };

    MatchResult {
        soundtrack,
        search_queries_used,
        candidates_considered,
        best_match,
        match_score,
        status,
        timestamp: Utc::now(),
    }
}
