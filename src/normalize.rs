//! Record normalization.
//!
//! Turns a raw upstream record into a canonical `SoundtrackRecord`. This is
//! the only place input validation happens; everything downstream can assume
//! a non-empty title and whitespace-clean fields.

use crate::models::{RawRecord, SoundtrackRecord};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("record has no title")]
    MissingTitle,
}

/// Collapse runs of whitespace and trim. Blank input becomes `None` so that
/// "field unknown" stays distinguishable from "field empty".
fn clean(value: &str) -> Option<String> {
    let cleaned = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Validate and canonicalize a raw record.
///
/// Pure function, no I/O. Fails only when the title is missing or empty
/// after trimming.
pub fn normalize_record(raw: &RawRecord) -> Result<SoundtrackRecord, ValidationError> {
    let title = raw
        .title
        .as_deref()
        .and_then(clean)
        .ok_or(ValidationError::MissingTitle)?;

    Ok(SoundtrackRecord {
        title,
        performer: raw.performer.as_deref().and_then(clean),
        composer: raw.composer.as_deref().and_then(clean),
        lyricist: raw.lyricist.as_deref().and_then(clean),
        movie_title: raw.movie_title.as_deref().and_then(clean),
    })
}
