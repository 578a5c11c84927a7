//! Candidate domain model.
//!
//! # Responsibility
//! - Define the canonical gallery entry shared by registry, storage and views.
//! - Validate entries before they enter the registry or leave storage.
//!
//! # Invariants
//! - `id` is unique within a registry and never reused.
//! - `votes` only grows; it is changed by the vote path alone.
//! - `vibe_score`, when set, is within `0..=100`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque candidate identifier.
///
/// Seeded entries use short numeric strings, submitted entries use UUIDs.
pub type CandidateId = String;

/// Upper bound for the AI-derived vibe score.
pub const MAX_VIBE_SCORE: u8 = 100;

/// Description stored when a submission leaves the field blank.
pub const DEFAULT_DESCRIPTION: &str = "New entry in the gallery.";

/// Photo entry eligible for voting.
///
/// Serialized in camelCase to stay compatible with stored `candidates`
/// records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    /// Image reference: remote URL or inline data URL.
    pub image_url: String,
    pub votes: u64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibe_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_critique: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

/// Validation failures for candidate records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateValidationError {
    EmptyId,
    EmptyName,
    EmptyImage,
    VibeScoreOutOfRange(u8),
}

impl Display for CandidateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "candidate id cannot be empty"),
            Self::EmptyName => write!(f, "candidate name cannot be empty"),
            Self::EmptyImage => write!(f, "candidate image cannot be empty"),
            Self::VibeScoreOutOfRange(score) => {
                write!(f, "vibe score {score} is outside 0..={MAX_VIBE_SCORE}")
            }
        }
    }
}

impl Error for CandidateValidationError {}

impl Candidate {
    /// Returns whether `query` (already lowercased) matches the name or any tag.
    pub fn matches_lowercase(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(query)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(query))
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), CandidateValidationError> {
        if self.id.trim().is_empty() {
            return Err(CandidateValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(CandidateValidationError::EmptyName);
        }
        if self.image_url.trim().is_empty() {
            return Err(CandidateValidationError::EmptyImage);
        }
        if let Some(score) = self.vibe_score {
            if score > MAX_VIBE_SCORE {
                return Err(CandidateValidationError::VibeScoreOutOfRange(score));
            }
        }
        Ok(())
    }
}

/// Caller-supplied fields for a new candidate.
///
/// Everything except id, vote count and timestamp, which the registry owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCandidate {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub vibe_score: Option<u8>,
    pub ai_critique: Option<String>,
    pub tags: Vec<String>,
}

impl NewCandidate {
    /// Requires name and image; blank description gets the default text.
    pub fn validate(&self) -> Result<(), CandidateValidationError> {
        if self.name.trim().is_empty() {
            return Err(CandidateValidationError::EmptyName);
        }
        if self.image_url.trim().is_empty() {
            return Err(CandidateValidationError::EmptyImage);
        }
        if let Some(score) = self.vibe_score {
            if score > MAX_VIBE_SCORE {
                return Err(CandidateValidationError::VibeScoreOutOfRange(score));
            }
        }
        Ok(())
    }

    pub(crate) fn into_candidate(self, id: CandidateId, timestamp: i64) -> Candidate {
        let description = if self.description.trim().is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            self.description
        };
        Candidate {
            id,
            name: self.name.trim().to_string(),
            image_url: self.image_url,
            votes: 0,
            description,
            vibe_score: self.vibe_score,
            ai_critique: self.ai_critique,
            tags: normalize_tags(&self.tags),
            timestamp,
        }
    }
}

/// Trims tags, drops blanks and removes case-insensitive duplicates.
///
/// First spelling wins, so display casing is preserved.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut out = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        let folded = trimmed.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        out.push(trimmed.to_string());
    }
    out
}
