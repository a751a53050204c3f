//! Local heuristic scorer, used when the oracle is unavailable.
//!
//! Blends token overlap between the record's fields and each candidate's
//! title/channel with a normalized popularity signal. Confidence is capped
//! below the oracle's attainable ceiling so heuristic results never outrank
//! oracle results at common thresholds.

use super::Adjudication;
use crate::decision::pick_preferred;
use crate::models::{MatchScore, ScoreSource, SoundtrackRecord, VideoCandidate};
use std::collections::HashSet;

/// Maximum confidence the heuristic may report.
pub const HEURISTIC_CONFIDENCE_CEILING: f64 = 0.75;

const SIMILARITY_WEIGHT: f64 = 0.7;
const POPULARITY_WEIGHT: f64 = 0.3;

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Fraction of the record's tokens found in the candidate text.
fn token_coverage(record_tokens: &HashSet<String>, candidate_text: &str) -> f64 {
    if record_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate_text);
    let hits = record_tokens
        .iter()
        .filter(|t| candidate_tokens.contains(*t))
        .count();
    hits as f64 / record_tokens.len() as f64
}

/// Log-scale view count normalized into [0, 1]; a billion views saturates.
fn popularity(view_count: u64) -> f64 {
    ((view_count as f64 + 1.0).log10() / 9.0).min(1.0)
}

fn candidate_score(record_tokens: &HashSet<String>, candidate: &VideoCandidate) -> f64 {
    let text = format!("{} {}", candidate.title, candidate.channel_name);
    SIMILARITY_WEIGHT * token_coverage(record_tokens, &text)
        + POPULARITY_WEIGHT * popularity(candidate.view_count)
}

/// Score the whole candidate set and select the best one.
///
/// Callers must guarantee a non-empty set; ties at the top score are broken
/// deterministically by view count, then metadata completeness.
pub fn score_candidates(record: &SoundtrackRecord, candidates: &[VideoCandidate]) -> Adjudication {
    let mut record_text = record.title.clone();
    for part in [&record.performer, &record.movie_title].into_iter().flatten() {
        record_text.push(' ');
        record_text.push_str(part);
    }
    let record_tokens = tokenize(&record_text);

    let scores: Vec<f64> = candidates
        .iter()
        .map(|c| candidate_score(&record_tokens, c))
        .collect();

    let best_score = scores.iter().cloned().fold(f64::MIN, f64::max);
    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| (**s - best_score).abs() < 1e-9)
        .map(|(i, _)| i)
        .collect();
    let selected = pick_preferred(candidates, &tied);

    let best = &candidates[selected];
    let coverage = token_coverage(
        &record_tokens,
        &format!("{} {}", best.title, best.channel_name),
    );
    let confidence = best_score.min(HEURISTIC_CONFIDENCE_CEILING);

    let mut key_factors = vec![format!(
        "{:.0}% of record tokens found in video title/channel",
        coverage * 100.0
    )];
    if best.view_count > 0 {
        key_factors.push(format!("{} views", best.view_count));
    }

    let mut concerns = vec!["oracle unavailable, heuristic text/popularity scoring used".to_string()];
    if coverage < 0.5 {
        concerns.push("low token overlap with record metadata".to_string());
    }
    if tied.len() > 1 {
        concerns.push(format!(
            "{} candidates scored equally, tie broken by popularity",
            tied.len()
        ));
    }

    Adjudication {
        selected_index: Some(selected),
        score: MatchScore {
            confidence,
            reasoning: format!(
                "Heuristic score {:.2} for '{}' ({}): token overlap with record metadata \
                 weighted against view-count popularity.",
                best_score, best.title, best.channel_name
            ),
            key_factors,
            concerns,
            source: ScoreSource::HeuristicFallback,
        },
    }
}
