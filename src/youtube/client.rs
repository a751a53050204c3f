//! YouTube Data API v3 client.
//!
//! Implements the search, detail and comment service traits over the public
//! REST API. Searches are restricted to the Music category.

use super::{CommentOutcome, CommentService, SearchError, VideoDetailService, VideoSearchService};
use crate::models::{watch_url, SearchHit, VideoDetails};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
/// YouTube category id for music videos.
const MUSIC_CATEGORY_ID: &str = "10";

/// Client for the YouTube Data API v3.
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    /// Create a new client against the public API endpoint.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Override the API base URL (used by integration tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn map_request_error(e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout
        } else {
            SearchError::Connection(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The Data API reports a spent daily budget as 403 quotaExceeded.
            if status.as_u16() == 403 && body.contains("quotaExceeded") {
                return Err(SearchError::QuotaExhausted);
            }
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl VideoSearchService for YouTubeClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!(
            "{}/search?part=snippet&type=video&videoCategoryId={}&order=relevance&q={}&maxResults={}&key={}",
            self.base_url,
            MUSIC_CATEGORY_ID,
            urlencoding::encode(query),
            max_results,
            self.api_key,
        );

        debug!(query, max_results, "issuing video search");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let body: SearchListResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("search response: {}", e)))?;

        let hits = body
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(parse_search_item)
            .collect::<Vec<_>>();

        if hits.is_empty() {
            warn!(query, "search returned no videos");
        }
        Ok(hits)
    }
}

#[async_trait]
impl VideoDetailService for YouTubeClient {
    async fn details(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoDetails>, SearchError> {
        if video_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!(
            "{}/videos?part=snippet,statistics&id={}&key={}",
            self.base_url,
            urlencoding::encode(&video_ids.join(",")),
            self.api_key,
        );

        debug!(count = video_ids.len(), "fetching video details");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let body: VideoListResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("videos response: {}", e)))?;

        let mut details = HashMap::new();
        for item in body.items.unwrap_or_default() {
            details.insert(item.id.clone(), parse_video_item(item));
        }
        Ok(details)
    }
}

#[async_trait]
impl CommentService for YouTubeClient {
    async fn comments(
        &self,
        video_id: &str,
        max_comments: u32,
    ) -> Result<CommentOutcome, SearchError> {
        let url = format!(
            "{}/commentThreads?part=snippet&videoId={}&maxResults={}&order=relevance&textFormat=plainText&key={}",
            self.base_url,
            urlencoding::encode(video_id),
            max_comments,
            self.api_key,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        // Videos with comments turned off answer 403; that is a normal
        // outcome, distinct from zero comments.
        if response.status().as_u16() == 403 {
            let body = response.text().await.unwrap_or_default();
            if body.contains("quotaExceeded") {
                return Err(SearchError::QuotaExhausted);
            }
            debug!(video_id, "comments are disabled for video");
            return Ok(CommentOutcome::Disabled);
        }

        let response = Self::check_status(response).await?;
        let body: CommentThreadsResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("comments response: {}", e)))?;

        let comments = body
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                item.snippet?
                    .top_level_comment?
                    .snippet
                    .and_then(|s| s.text_display)
            })
            .collect();

        Ok(CommentOutcome::Comments(comments))
    }
}

fn parse_search_item(item: SearchItem) -> Option<SearchHit> {
    let video_id = item.id?.video_id?;
    let snippet = item.snippet?;
    Some(SearchHit {
        url: watch_url(&video_id),
        video_id,
        title: snippet.title.unwrap_or_default(),
        channel_name: snippet.channel_title.unwrap_or_default(),
        thumbnail_url: snippet
            .thumbnails
            .and_then(|t| t.default)
            .and_then(|d| d.url),
    })
}

fn parse_video_item(item: VideoItem) -> VideoDetails {
    let statistics = item.statistics.unwrap_or_default();
    VideoDetails {
        view_count: statistics
            .view_count
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        like_count: statistics.like_count.as_deref().and_then(|v| v.parse().ok()),
        description: item
            .snippet
            .and_then(|s| s.description)
            .filter(|d| !d.is_empty()),
    }
}

// YouTube Data API wire types

#[derive(Deserialize)]
struct SearchListResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    title: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    description: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Deserialize)]
struct VideoListResponse {
    items: Option<Vec<VideoItem>>,
}

#[derive(Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    statistics: Option<Statistics>,
}

#[derive(Deserialize, Default)]
struct Statistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
}

#[derive(Deserialize)]
struct CommentThreadsResponse {
    items: Option<Vec<CommentThread>>,
}

#[derive(Deserialize)]
struct CommentThread {
    snippet: Option<CommentThreadSnippet>,
}

#[derive(Deserialize)]
struct CommentThreadSnippet {
    #[serde(rename = "topLevelComment")]
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Deserialize)]
struct CommentSnippet {
    #[serde(rename = "textDisplay")]
    text_display: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "items": [
                {
                    "id": {"kind": "youtube#video", "videoId": "abc123"},
                    "snippet": {
                        "title": "My Heart Will Go On",
                        "channelTitle": "CelineDionVEVO",
                        "thumbnails": {"default": {"url": "https://i.ytimg.com/vi/abc123/default.jpg"}}
                    }
                },
                {
                    "id": {"kind": "youtube#channel"},
                    "snippet": {"title": "Not a video"}
                }
            ]
        }"#;

        let body: SearchListResponse = serde_json::from_str(json).unwrap();
        let hits: Vec<_> = body
            .items
            .unwrap()
            .into_iter()
            .filter_map(parse_search_item)
            .collect();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].video_id, "abc123");
        assert_eq!(hits[0].channel_name, "CelineDionVEVO");
        assert_eq!(hits[0].url, "https://www.youtube.com/watch?v=abc123");
        assert!(hits[0].thumbnail_url.is_some());
    }

    #[test]
    fn test_parse_video_details() {
        let json = r#"{
            "items": [
                {
                    "id": "abc123",
                    "snippet": {"title": "My Heart Will Go On", "description": "Official video"},
                    "statistics": {"viewCount": "1234567", "likeCount": "8901"}
                },
                {
                    "id": "nostats",
                    "snippet": {"title": "Obscure upload", "description": ""}
                }
            ]
        }"#;

        let body: VideoListResponse = serde_json::from_str(json).unwrap();
        let mut items = body.items.unwrap().into_iter();

        let full = parse_video_item(items.next().unwrap());
        assert_eq!(full.view_count, 1_234_567);
        assert_eq!(full.like_count, Some(8_901));
        assert_eq!(full.description.as_deref(), Some("Official video"));

        let bare = parse_video_item(items.next().unwrap());
        assert_eq!(bare.view_count, 0);
        assert!(bare.like_count.is_none());
        assert!(bare.description.is_none());
    }

    #[test]
    fn test_parse_comment_threads() {
        let json = r#"{
            "items": [
                {"snippet": {"topLevelComment": {"snippet": {"textDisplay": "This song is timeless"}}}},
                {"snippet": {"topLevelComment": {"snippet": {}}}}
            ]
        }"#;

        let body: CommentThreadsResponse = serde_json::from_str(json).unwrap();
        let comments: Vec<_> = body
            .items
            .unwrap()
            .into_iter()
            .filter_map(|item| {
                item.snippet?
                    .top_level_comment?
                    .snippet
                    .and_then(|s| s.text_display)
            })
            .collect();

        assert_eq!(comments, vec!["This song is timeless"]);
    }
}
