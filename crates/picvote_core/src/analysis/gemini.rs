//! Gemini `generateContent` analyzer over REST.
//!
//! # Responsibility
//! - Send one inline image plus the contest critique instruction.
//! - Request a JSON response constrained by a response schema.
//! - Decode the first candidate's text into an [`Analysis`].
//!
//! # Invariants
//! - One request per call; no retries.
//! - Every request carries the configured timeout.

use super::{
    parse_analysis_json, Analysis, AnalysisError, AnalysisResult, ImageAnalyzer, ImagePayload,
};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Default model used for critiques.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
/// Default REST base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default per-request timeout.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

const ANALYSIS_INSTRUCTION: &str = "Analyze this candidate's entry photo for a photography contest. Provide a creative critique (max 3 sentences), a 'Vibe Score' (0-100), and 3 relevant hashtags. Format as JSON.";

/// Connection settings for [`GeminiAnalyzer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Analyzer backed by the Gemini REST API.
pub struct GeminiAnalyzer {
    client: Client,
    config: GeminiConfig,
}

impl GeminiAnalyzer {
    /// Builds the HTTP client.
    ///
    /// # Errors
    /// - `MissingApiKey` when the key is blank.
    /// - `Transport` when the client cannot be constructed.
    pub fn new(config: GeminiConfig) -> AnalysisResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AnalysisError::MissingApiKey);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, image: &ImagePayload) -> AnalysisResult<Analysis> {
        image.validate()?;
        let request = build_request(image);
        debug!(
            "event=gemini_request module=analysis status=start model={} mime={}",
            self.config.model,
            image.mime_type()
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_generate_response(&body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: &'a str,
    },
    Text(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

fn build_request(image: &ImagePayload) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    mime_type: image.mime_type(),
                    data: image.base64_data(),
                },
                Part::Text(ANALYSIS_INSTRUCTION),
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
        },
    }
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "critique": { "type": "STRING" },
            "vibeScore": { "type": "NUMBER" },
            "tags": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["critique", "vibeScore", "tags"]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Extracts the analysis JSON from a `generateContent` response body.
///
/// Text parts of the first candidate are concatenated; a response with no
/// text decodes as `{}` and therefore fails the schema check.
pub fn parse_generate_response(body: &str) -> AnalysisResult<Analysis> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| AnalysisError::MalformedResponse(err.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    parse_analysis_json(&text)
}
