//! Search query planning.
//!
//! Builds the ordered list of search queries for a record, most specific
//! first. Tiers whose fields are unavailable are skipped, so the retriever
//! never issues an empty or duplicate query.

use crate::models::SoundtrackRecord;

/// Default cap on the number of relaxation tiers issued per record.
pub const DEFAULT_MAX_QUERIES: usize = 4;

/// Produce the relaxation sequence for a record.
///
/// Tier order: title+performer+movie, title+performer, title+movie, title.
/// Deterministic for a given record and cap. Non-empty whenever the record
/// has a title, which the normalizer guarantees.
pub fn plan_queries(record: &SoundtrackRecord, max_queries: usize) -> Vec<String> {
    let tiers: [Vec<Option<&str>>; 4] = [
        vec![
            Some(record.title.as_str()),
            record.performer.as_deref(),
            record.movie_title.as_deref(),
        ],
        vec![Some(record.title.as_str()), record.performer.as_deref()],
        vec![Some(record.title.as_str()), record.movie_title.as_deref()],
        vec![Some(record.title.as_str())],
    ];

    let mut queries = Vec::new();
    for tier in &tiers {
        if queries.len() >= max_queries {
            break;
        }
        // A tier is usable only when every field it calls for is present.
        if tier.iter().any(|part| part.is_none()) {
            continue;
        }
        let query = tier
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if !queries.contains(&query) {
            queries.push(query);
        }
    }
    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SoundtrackRecord;

    fn full_record() -> SoundtrackRecord {
        SoundtrackRecord {
            title: "My Heart Will Go On".to_string(),
            performer: Some("Céline Dion".to_string()),
            composer: Some("James Horner".to_string()),
            lyricist: Some("Will Jennings".to_string()),
            movie_title: Some("Titanic".to_string()),
        }
    }

    #[test]
    fn test_full_record_yields_all_tiers() {
        let queries = plan_queries(&full_record(), DEFAULT_MAX_QUERIES);
        assert_eq!(
            queries,
            vec![
                "My Heart Will Go On Céline Dion Titanic",
                "My Heart Will Go On Céline Dion",
                "My Heart Will Go On Titanic",
                "My Heart Will Go On",
            ]
        );
    }

    #[test]
    fn test_missing_fields_skip_tiers() {
        let record = SoundtrackRecord::with_title("Lament");
        let queries = plan_queries(&record, DEFAULT_MAX_QUERIES);
        assert_eq!(queries, vec!["Lament"]);
    }

    #[test]
    fn test_performer_only() {
        let record = SoundtrackRecord {
            performer: Some("Gaelic Storm".to_string()),
            ..SoundtrackRecord::with_title("An Irish Party in Third Class")
        };
        let queries = plan_queries(&record, DEFAULT_MAX_QUERIES);
        assert_eq!(
            queries,
            vec![
                "An Irish Party in Third Class Gaelic Storm",
                "An Irish Party in Third Class",
            ]
        );
    }

    #[test]
    fn test_cap_respected() {
        let queries = plan_queries(&full_record(), 2);
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], "My Heart Will Go On Céline Dion Titanic");
    }

    #[test]
    fn test_deterministic() {
        let a = plan_queries(&full_record(), DEFAULT_MAX_QUERIES);
        let b = plan_queries(&full_record(), DEFAULT_MAX_QUERIES);
        assert_eq!(a, b);
    }
}
