//! Image analysis collaborator boundary.
//!
//! # Responsibility
//! - Define the analyzer contract used by the submission flow.
//! - Absorb every analyzer failure into one fixed fallback result.
//!
//! # Invariants
//! - `analyze_or_fallback` never returns an error.
//! - A returned `Analysis` always has a score within `0..=100`.
//! - Image bytes and critique text are never logged.

pub mod gemini;

use crate::model::candidate::{normalize_tags, MAX_VIBE_SCORE};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub use gemini::{GeminiAnalyzer, GeminiConfig};

static DATA_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(?P<mime>[^;,]*)(?P<params>(?:;[^;,]*)*),").expect("valid data url regex")
});

/// MIME type sent when the payload does not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

const FALLBACK_CRITIQUE: &str = "A striking and memorable image.";
const FALLBACK_VIBE_SCORE: u8 = 85;
const FALLBACK_TAGS: [&str; 3] = ["Creative", "Photography", "VisualStory"];

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Failure modes of an analyzer call.
#[derive(Debug)]
pub enum AnalysisError {
    /// No API key configured; analysis is disabled.
    MissingApiKey,
    /// Payload is not usable base64 image data.
    InvalidPayload(String),
    Transport(reqwest::Error),
    Timeout,
    /// Non-success HTTP status.
    Status(u16),
    /// Response body or embedded text is not the expected JSON.
    MalformedResponse(String),
    /// JSON decoded but violates the result contract.
    SchemaMismatch(String),
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "image analysis api key is not configured"),
            Self::InvalidPayload(message) => write!(f, "invalid image payload: {message}"),
            Self::Transport(err) => write!(f, "image analysis transport error: {err}"),
            Self::Timeout => write!(f, "image analysis timed out"),
            Self::Status(code) => write!(f, "image analysis returned http status {code}"),
            Self::MalformedResponse(message) => {
                write!(f, "malformed image analysis response: {message}")
            }
            Self::SchemaMismatch(message) => {
                write!(f, "image analysis response schema mismatch: {message}")
            }
        }
    }
}

impl Error for AnalysisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl AnalysisError {
    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Transport(_) => "transport",
            Self::Timeout => "timeout",
            Self::Status(_) => "http_status",
            Self::MalformedResponse(_) => "malformed_response",
            Self::SchemaMismatch(_) => "schema_mismatch",
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(value)
        }
    }
}

/// Critique, vibe score and tags produced for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub critique: String,
    pub vibe_score: u8,
    pub tags: Vec<String>,
}

impl Analysis {
    /// Fixed result substituted for any analyzer failure.
    pub fn fallback() -> Self {
        Self {
            critique: FALLBACK_CRITIQUE.to_string(),
            vibe_score: FALLBACK_VIBE_SCORE,
            tags: FALLBACK_TAGS.iter().map(|tag| (*tag).to_string()).collect(),
        }
    }
}

/// Wire shape of an analysis before range checks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    critique: String,
    vibe_score: f64,
    tags: Vec<String>,
}

/// Decodes and checks analysis JSON text.
///
/// The score must be finite and within `0..=100`; fractional scores are
/// rounded. The critique must be non-blank and at least one non-blank tag
/// must remain after normalization.
pub fn parse_analysis_json(text: &str) -> AnalysisResult<Analysis> {
    let trimmed = text.trim();
    let source = if trimmed.is_empty() { "{}" } else { trimmed };
    let value: serde_json::Value = serde_json::from_str(source)
        .map_err(|err| AnalysisError::MalformedResponse(err.to_string()))?;
    let raw: RawAnalysis = serde_json::from_value(value)
        .map_err(|err| AnalysisError::SchemaMismatch(err.to_string()))?;

    if !raw.vibe_score.is_finite() || !(0.0..=f64::from(MAX_VIBE_SCORE)).contains(&raw.vibe_score)
    {
        return Err(AnalysisError::SchemaMismatch(format!(
            "vibeScore {} is outside 0..={MAX_VIBE_SCORE}",
            raw.vibe_score
        )));
    }
    let critique = raw.critique.trim().to_string();
    if critique.is_empty() {
        return Err(AnalysisError::SchemaMismatch("critique is empty".to_string()));
    }
    let tags = normalize_tags(&raw.tags);
    if tags.is_empty() {
        return Err(AnalysisError::SchemaMismatch("tags are empty".to_string()));
    }

    Ok(Analysis {
        critique,
        vibe_score: raw.vibe_score.round() as u8,
        tags,
    })
}

/// Image sent for analysis: a data URL or bare base64 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    raw: String,
}

impl ImagePayload {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Encodes raw image bytes as a base64 data URL.
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        let mime = if mime_type.trim().is_empty() {
            DEFAULT_IMAGE_MIME
        } else {
            mime_type.trim()
        };
        Self::new(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// Full payload text, used as the candidate image reference.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Declared MIME type, or [`DEFAULT_IMAGE_MIME`].
    pub fn mime_type(&self) -> &str {
        DATA_URL_RE
            .captures(&self.raw)
            .and_then(|caps| caps.name("mime"))
            .map(|m| m.as_str())
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
    }

    /// Base64 portion with any data URL prefix stripped.
    pub fn base64_data(&self) -> &str {
        match DATA_URL_RE.find(&self.raw) {
            Some(prefix) => &self.raw[prefix.end()..],
            None => self.raw.trim(),
        }
    }

    /// Checks that the base64 portion decodes to a non-empty image.
    pub fn validate(&self) -> AnalysisResult<()> {
        let data = self.base64_data();
        if data.is_empty() {
            return Err(AnalysisError::InvalidPayload("no image data".to_string()));
        }
        let decoded = STANDARD
            .decode(data)
            .map_err(|err| AnalysisError::InvalidPayload(err.to_string()))?;
        if decoded.is_empty() {
            return Err(AnalysisError::InvalidPayload("no image data".to_string()));
        }
        Ok(())
    }
}

/// External image analysis service.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image: &ImagePayload) -> AnalysisResult<Analysis>;
}

/// Analyzer used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAnalyzer;

#[async_trait]
impl ImageAnalyzer for DisabledAnalyzer {
    async fn analyze(&self, _image: &ImagePayload) -> AnalysisResult<Analysis> {
        Err(AnalysisError::MissingApiKey)
    }
}

/// Runs `analyzer` and substitutes [`Analysis::fallback`] on any failure.
pub async fn analyze_or_fallback(analyzer: &dyn ImageAnalyzer, image: &ImagePayload) -> Analysis {
    let started_at = Instant::now();
    info!("event=image_analyze module=analysis status=start");

    match analyzer.analyze(image).await {
        Ok(analysis) => {
            info!(
                "event=image_analyze module=analysis status=ok duration_ms={} vibe_score={} tag_count={}",
                started_at.elapsed().as_millis(),
                analysis.vibe_score,
                analysis.tags.len()
            );
            analysis
        }
        Err(err) => {
            warn!(
                "event=image_analyze module=analysis status=fallback duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            );
            Analysis::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        analyze_or_fallback, parse_analysis_json, Analysis, AnalysisError, DisabledAnalyzer,
        ImagePayload, DEFAULT_IMAGE_MIME,
    };

    #[test]
    fn payload_strips_data_url_prefix() {
        let payload = ImagePayload::new("data:image/png;base64,aGVsbG8=");
        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.base64_data(), "aGVsbG8=");
        payload.validate().expect("payload should decode");
    }

    #[test]
    fn bare_base64_uses_default_mime() {
        let payload = ImagePayload::new("aGVsbG8=");
        assert_eq!(payload.mime_type(), DEFAULT_IMAGE_MIME);
        assert_eq!(payload.base64_data(), "aGVsbG8=");
    }

    #[test]
    fn from_bytes_builds_data_url() {
        let payload = ImagePayload::from_bytes(b"hello", "image/webp");
        assert_eq!(payload.as_str(), "data:image/webp;base64,aGVsbG8=");
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = ImagePayload::new("data:image/png;base64,@@@")
            .validate()
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPayload(_)));
    }

    #[test]
    fn parse_accepts_valid_result_and_rounds_score() {
        let analysis = parse_analysis_json(
            r#"{"critique":"Bold light.","vibeScore":77.6,"tags":["Light","light","Bold"]}"#,
        )
        .unwrap();
        assert_eq!(analysis.vibe_score, 78);
        assert_eq!(analysis.tags, ["Light", "Bold"]);
    }

    #[test]
    fn parse_rejects_out_of_range_score_and_missing_fields() {
        let err = parse_analysis_json(r#"{"critique":"x","vibeScore":140,"tags":[]}"#)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch(_)));

        let err = parse_analysis_json("").unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch(_)));

        let err = parse_analysis_json("not json").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));
    }

    #[test]
    fn parse_rejects_missing_or_blank_tags() {
        let err = parse_analysis_json(r#"{"critique":"Warm.","vibeScore":70,"tags":[]}"#)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch(_)));

        let err = parse_analysis_json(r#"{"critique":"Warm.","vibeScore":70,"tags":[" ",""]}"#)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch(_)));
    }

    #[tokio::test]
    async fn disabled_analyzer_yields_fallback() {
        let payload = ImagePayload::new("aGVsbG8=");
        let analysis = analyze_or_fallback(&DisabledAnalyzer, &payload).await;
        assert_eq!(analysis, Analysis::fallback());
        assert_eq!(analysis.critique, "A striking and memorable image.");
        assert_eq!(analysis.vibe_score, 85);
        assert_eq!(analysis.tags, ["Creative", "Photography", "VisualStory"]);
    }
}
