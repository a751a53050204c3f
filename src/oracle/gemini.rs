//! Gemini-backed match oracle.
//!
//! Calls the Gemini generateContent API with a structured-output JSON schema
//! so the reply parses directly into a verdict. Works against any endpoint
//! implementing the Google AI REST surface.

use super::prompt::build_matching_prompt;
use super::{MatchOracle, OracleError, OracleVerdict};
use crate::models::{SoundtrackRecord, VideoCandidate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Oracle implementation over the Gemini generateContent API.
pub struct GeminiOracle {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiOracle {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| OracleError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Override the API base URL (used by integration tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl MatchOracle for GeminiOracle {
    async fn adjudicate(
        &self,
        record: &SoundtrackRecord,
        candidates: &[VideoCandidate],
    ) -> Result<OracleVerdict, OracleError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_matching_prompt(record, candidates),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 4096,
                response_mime_type: "application/json".to_string(),
                response_schema: reply_schema(candidates.len()),
            },
        };

        debug!(
            model = %self.model,
            candidate_count = candidates.len(),
            title = %record.title,
            "sending adjudication request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(OracleError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(format!("response body: {}", e)))?;

        let text = body
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| OracleError::InvalidResponse("no content in response".to_string()))?;

        debug!(reply_len = text.len(), "received adjudication reply");

        parse_reply(&text, candidates.len())
    }
}

/// Parse the structured JSON reply into a verdict.
///
/// `best_match_index` is 1-based; 0 means "no suitable match". Anything
/// outside [0, candidate_count] is an invalid response.
fn parse_reply(text: &str, candidate_count: usize) -> Result<OracleVerdict, OracleError> {
    let reply: MatchReply = serde_json::from_str(text)
        .map_err(|e| OracleError::InvalidResponse(format!("reply JSON: {}", e)))?;

    let selected_index = match reply.best_match_index {
        0 => None,
        i if i >= 1 && (i as usize) <= candidate_count => Some(i as usize - 1),
        i => {
            return Err(OracleError::InvalidResponse(format!(
                "best_match_index {} out of range for {} candidates",
                i, candidate_count
            )))
        }
    };

    if !reply.confidence.is_finite() || !(0.0..=1.0).contains(&reply.confidence) {
        return Err(OracleError::InvalidResponse(format!(
            "confidence out of range: {}",
            reply.confidence
        )));
    }

    Ok(OracleVerdict {
        selected_index,
        confidence: reply.confidence,
        reasoning: reply.reasoning,
        key_factors: reply.key_factors,
        concerns: reply.concerns,
    })
}

fn reply_schema(candidate_count: usize) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "best_match_index": {
                "type": "integer",
                "description": format!(
                    "1-based index of the best matching candidate, or 0 for no suitable match (0 to {})",
                    candidate_count
                )
            },
            "confidence": {
                "type": "number",
                "description": "Confidence score between 0.0 and 1.0"
            },
            "reasoning": {
                "type": "string",
                "description": "Detailed explanation of the choice"
            },
            "key_factors": {
                "type": "array",
                "items": {"type": "string"}
            },
            "concerns": {
                "type": "array",
                "items": {"type": "string"}
            }
        },
        "required": ["best_match_index", "confidence", "reasoning"]
    })
}

// Gemini API wire types

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<ResponseCandidate>>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Deserialize)]
struct MatchReply {
    best_match_index: i64,
    confidence: f64,
    reasoning: String,
    #[serde(default)]
    key_factors: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
}
