//! Data model for the linking pipeline.
//!
//! A `SoundtrackRecord` flows through query planning, retrieval and
//! enrichment into a `MatchResult`. Records are immutable once normalized;
//! candidates are mutated only by the enricher before adjudication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record as supplied by the upstream producer, before normalization.
///
/// All fields are optional at this stage; the normalizer rejects records
/// without a usable title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub title: Option<String>,
    pub performer: Option<String>,
    pub composer: Option<String>,
    pub lyricist: Option<String>,
    pub movie_title: Option<String>,
}

/// Canonical description of one piece of music associated with a movie.
///
/// Identity is structural equality of the fields. `None` means the field is
/// unknown, which downstream components treat differently from an empty
/// string (the normalizer never produces empty strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundtrackRecord {
    pub title: String,
    pub performer: Option<String>,
    pub composer: Option<String>,
    pub lyricist: Option<String>,
    pub movie_title: Option<String>,
}

impl SoundtrackRecord {
    /// Record with only a title, for tests and ad-hoc lookups.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            performer: None,
            composer: None,
            lyricist: None,
            movie_title: None,
        }
    }
}

/// A single item from a video search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// Extended per-video detail fetched during enrichment.
#[derive(Debug, Clone, Default)]
pub struct VideoDetails {
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub description: Option<String>,
}

/// A video returned by the search service as a possible match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub url: String,
    pub description: Option<String>,
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub comments: Vec<String>,
    /// Set when enrichment only partially succeeded for this candidate.
    pub degraded: bool,
}

impl VideoCandidate {
    /// Build a candidate from a search hit. Enrichment fields start empty.
    pub fn from_hit(hit: SearchHit) -> Self {
        Self {
            video_id: hit.video_id,
            title: hit.title,
            channel_name: hit.channel_name,
            url: hit.url,
            description: None,
            view_count: 0,
            like_count: None,
            comments: Vec::new(),
            degraded: false,
        }
    }
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Where a match score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Oracle,
    HeuristicFallback,
}

/// Confidence and rationale for a match decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchScore {
    /// Always within [0, 1].
    pub confidence: f64,
    pub reasoning: String,
    pub key_factors: Vec<String>,
    pub concerns: Vec<String>,
    pub source: ScoreSource,
}

/// Terminal status of one record's pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// A candidate was selected at or above the confidence threshold.
    Resolved,
    /// Retrieval and adjudication ran, but nothing qualified.
    NoMatch,
    /// The pipeline could not complete for this record.
    Failed,
    /// The batch deadline expired before this record completed.
    TimedOut,
}

/// Final outcome for one soundtrack record.
///
/// `best_match` is present iff `status == Resolved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub soundtrack: SoundtrackRecord,
    pub search_queries_used: Vec<String>,
    pub candidates_considered: usize,
    pub best_match: Option<VideoCandidate>,
    pub match_score: Option<MatchScore>,
    pub status: MatchStatus,
    pub timestamp: DateTime<Utc>,
}

impl MatchResult {
    /// Result for a record whose retrieval failed on every query.
    pub fn failed(soundtrack: SoundtrackRecord, search_queries_used: Vec<String>) -> Self {
        Self {
            soundtrack,
            search_queries_used,
            candidates_considered: 0,
            best_match: None,
            match_score: None,
            status: MatchStatus::Failed,
            timestamp: Utc::now(),
        }
    }

    /// Result for a record cancelled by the batch deadline.
    pub fn timed_out(soundtrack: SoundtrackRecord) -> Self {
        Self {
            soundtrack,
            search_queries_used: Vec::new(),
            candidates_considered: 0,
            best_match: None,
            match_score: None,
            status: MatchStatus::TimedOut,
            timestamp: Utc::now(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == MatchStatus::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hit_starts_unenriched() {
        let hit = SearchHit {
            video_id: "abc123".to_string(),
            title: "My Song".to_string(),
            channel_name: "Some Channel".to_string(),
            url: watch_url("abc123"),
            thumbnail_url: None,
        };

        let candidate = VideoCandidate::from_hit(hit);
        assert_eq!(candidate.video_id, "abc123");
        assert_eq!(candidate.view_count, 0);
        assert!(candidate.description.is_none());
        assert!(candidate.comments.is_empty());
        assert!(!candidate.degraded);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&MatchStatus::TimedOut).unwrap();
        assert_eq!(json, "\"timed_out\"");
        let json = serde_json::to_string(&MatchStatus::NoMatch).unwrap();
        assert_eq!(json, "\"no_match\"");
        let json = serde_json::to_string(&ScoreSource::HeuristicFallback).unwrap();
        assert_eq!(json, "\"heuristic_fallback\"");
    }

    #[test]
    fn test_failed_result_has_no_match() {
        let result = MatchResult::failed(SoundtrackRecord::with_title("X"), vec!["X".to_string()]);
        assert_eq!(result.status, MatchStatus::Failed);
        assert!(result.best_match.is_none());
        assert!(result.match_score.is_none());
        assert_eq!(result.candidates_considered, 0);
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("dQw4w9WgXcQ"), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
