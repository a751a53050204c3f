//! Prompt construction for the matching oracle.

use crate::models::{SoundtrackRecord, VideoCandidate};
use std::fmt::Write;

const MAX_DESCRIPTION_CHARS: usize = 500;
const MAX_COMMENT_CHARS: usize = 80;
const MAX_COMMENTS_IN_PROMPT: usize = 5;

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Unknown")
}

/// Build the adjudication prompt covering the record and every candidate.
pub(super) fn build_matching_prompt(
    record: &SoundtrackRecord,
    candidates: &[VideoCandidate],
) -> String {
    let mut prompt = String::new();

    let _ = write!(
        prompt,
        "You are an expert music curator tasked with finding the best YouTube video match \
         for a specific soundtrack from a movie.\n\n\
         ## Soundtrack Metadata\n\
         - **Title**: {}\n\
         - **Performer**: {}\n\
         - **Composer**: {}\n\
         - **Lyrics By**: {}\n\
         - **Movie**: {}\n\n\
         ## Candidate YouTube Videos\n",
        record.title,
        field(&record.performer),
        field(&record.composer),
        field(&record.lyricist),
        field(&record.movie_title),
    );

    for (i, video) in candidates.iter().enumerate() {
        let _ = write!(
            prompt,
            "\n### Candidate {}\n\
             - **Video ID**: {}\n\
             - **Title**: {}\n\
             - **Channel**: {}\n\
             - **Description**: {}\n\
             - **Views**: {}\n\
             - **Likes**: {}\n",
            i + 1,
            video.video_id,
            video.title,
            video.channel_name,
            video
                .description
                .as_deref()
                .map(|d| truncate_chars(d, MAX_DESCRIPTION_CHARS))
                .unwrap_or_else(|| "No description".to_string()),
            video.view_count,
            video
                .like_count
                .map(|l| l.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        );

        if !video.comments.is_empty() {
            prompt.push_str("- **Top Comments**:\n");
            for comment in video.comments.iter().take(MAX_COMMENTS_IN_PROMPT) {
                let _ = writeln!(prompt, "  - {}", truncate_chars(comment, MAX_COMMENT_CHARS));
            }
        }
    }

    let _ = write!(
        prompt,
        "\n## Your Task\n\
         Analyze each candidate video and determine which one is the BEST match for the \
         soundtrack metadata provided. Consider:\n\n\
         1. **Title Match**: Does the video title match the song title and performer?\n\
         2. **Artist/Performer Match**: Is the correct artist/performer featured?\n\
         3. **Context Match**: Does the description or comments mention the movie or soundtrack context?\n\
         4. **Authenticity**: Is this an official upload, high-quality recording, or authentic performance?\n\
         5. **Popularity**: Higher views/likes may indicate the canonical version (but not always)\n\
         6. **Comments Analysis**: Do comments confirm this is the right version from the movie?\n\n\
         ## Your Response\n\
         Select the best match and provide:\n\
         - **best_match_index**: The candidate number (1 to {}), or 0 if none of the candidates \
         is a suitable match\n\
         - **confidence**: Score from 0.0 to 1.0\n\
         - **reasoning**: Detailed explanation of your choice\n\
         - **key_factors**: List of supporting factors\n\
         - **concerns**: Any issues or uncertainties\n\n\
         Be thorough in your analysis.\n",
        candidates.len(),
    );

    prompt
}
