//! Verification oracle adapter.
//!
//! One adjudication call per record: the oracle reasons over the whole
//! candidate set at once so it can compare alternatives. A malformed reply,
//! timeout or unreachable service falls back to the local heuristic scorer;
//! the adapter guarantees a score for any non-empty candidate set.

mod gemini;
pub mod heuristic;
mod prompt;

pub use gemini::{GeminiOracle, DEFAULT_MODEL};

use crate::models::{MatchScore, ScoreSource, SoundtrackRecord, VideoCandidate};
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// Errors from the semantic-reasoning oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timeout")]
    Timeout,

    #[error("rate limited")]
    RateLimited,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Structured oracle reply, validated at the adapter boundary.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    /// Index into the candidate set that was sent, or `None` when the
    /// oracle judged that no candidate fits.
    pub selected_index: Option<usize>,
    /// Always within [0, 1].
    pub confidence: f64,
    pub reasoning: String,
    pub key_factors: Vec<String>,
    pub concerns: Vec<String>,
}

/// Adjudicates a candidate set against a soundtrack record.
#[async_trait]
pub trait MatchOracle: Send + Sync {
    /// Pick the best candidate, if any. Implementations must return a
    /// verdict whose `selected_index` references the given set and whose
    /// confidence is in [0, 1], or an error.
    async fn adjudicate(
        &self,
        record: &SoundtrackRecord,
        candidates: &[VideoCandidate],
    ) -> Result<OracleVerdict, OracleError>;
}

/// Outcome of adjudication, oracle-backed or heuristic.
#[derive(Debug, Clone)]
pub struct Adjudication {
    pub selected_index: Option<usize>,
    pub score: MatchScore,
}

/// Run the oracle and fall back to the heuristic scorer on any failure.
///
/// Returns `None` only for an empty candidate set. A verdict that fails
/// boundary validation is treated the same as an unavailable oracle.
pub async fn adjudicate_with_fallback(
    oracle: &dyn MatchOracle,
    record: &SoundtrackRecord,
    candidates: &[VideoCandidate],
) -> Option<Adjudication> {
    if candidates.is_empty() {
        return None;
    }

    let verdict = match oracle.adjudicate(record, candidates).await {
        Ok(verdict) => match validate_verdict(verdict, candidates.len()) {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                warn!(title = %record.title, error = %e, "oracle verdict failed validation");
                None
            }
        },
        Err(e) => {
            warn!(title = %record.title, error = %e, "oracle unavailable, using heuristic scorer");
            None
        }
    };

    match verdict {
        Some(verdict) => Some(Adjudication {
            selected_index: verdict.selected_index,
            score: MatchScore {
                confidence: verdict.confidence,
                reasoning: verdict.reasoning,
                key_factors: verdict.key_factors,
                concerns: verdict.concerns,
                source: ScoreSource::Oracle,
            },
        }),
        None => Some(heuristic::score_candidates(record, candidates)),
    }
}

/// Reject verdicts whose fields cannot be trusted downstream.
fn validate_verdict(verdict: OracleVerdict, candidate_count: usize) -> Result<OracleVerdict, OracleError> {
    if !verdict.confidence.is_finite() || !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(OracleError::InvalidResponse(format!(
            "confidence out of range: {}",
            verdict.confidence
        )));
    }
    if let Some(index) = verdict.selected_index {
        if index >= candidate_count {
            return Err(OracleError::InvalidResponse(format!(
                "selected index {} out of range for {} candidates",
                index, candidate_count
            )));
        }
    }
    Ok(verdict)
}
