//! Substring filter and sort projection over candidates.
//!
//! # Invariants
//! - Matching is a case-insensitive substring test on name or any tag.
//! - Sorting is stable: entries with equal keys keep registry order.
//! - The projection owns no state; it is recomputed on every call.

use crate::model::candidate::Candidate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Gallery ordering selected by the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Vote count, highest first.
    #[default]
    Votes,
    /// Timestamp, latest first.
    Newest,
    /// Timestamp, earliest first.
    Oldest,
}

impl SortOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Votes => "votes",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }
}

impl Display for SortOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown sort option text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortOptionError(pub String);

impl Display for ParseSortOptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported sort option `{}`; expected votes|newest|oldest",
            self.0
        )
    }
}

impl Error for ParseSortOptionError {}

impl FromStr for SortOption {
    type Err = ParseSortOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "votes" => Ok(Self::Votes),
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            other => Err(ParseSortOptionError(other.to_string())),
        }
    }
}

/// Search text plus ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryQuery {
    pub text: String,
    pub sort: SortOption,
}

impl GalleryQuery {
    pub fn new(text: impl Into<String>, sort: SortOption) -> Self {
        Self {
            text: text.into(),
            sort,
        }
    }
}

/// Returns the candidates matching `query.text`, ordered by `query.sort`.
///
/// Blank search text matches everything.
pub fn filter_and_sort(candidates: &[Candidate], query: &GalleryQuery) -> Vec<Candidate> {
    let needle = query.text.to_lowercase();
    let mut visible: Vec<Candidate> = candidates
        .iter()
        .filter(|candidate| candidate.matches_lowercase(&needle))
        .cloned()
        .collect();

    match query.sort {
        SortOption::Votes => visible.sort_by(|a, b| b.votes.cmp(&a.votes)),
        SortOption::Newest => visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortOption::Oldest => visible.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::{filter_and_sort, GalleryQuery, SortOption};
    use crate::model::seed::seed_candidates;

    fn names(query: &GalleryQuery) -> Vec<String> {
        filter_and_sort(&seed_candidates(10_000_000), query)
            .into_iter()
            .map(|candidate| candidate.name)
            .collect()
    }

    #[test]
    fn empty_query_sorted_by_votes_descending() {
        let listed = names(&GalleryQuery::new("", SortOption::Votes));
        assert_eq!(listed, ["Quiet Coffee", "The Adventurer", "Urban Echo"]);
    }

    #[test]
    fn query_matches_tags_case_insensitively() {
        let listed = names(&GalleryQuery::new("nature", SortOption::Votes));
        assert_eq!(listed, ["The Adventurer"]);
    }

    #[test]
    fn query_matches_name_substring() {
        let listed = names(&GalleryQuery::new("ECHO", SortOption::Newest));
        assert_eq!(listed, ["Urban Echo"]);
    }

    #[test]
    fn newest_and_oldest_are_mirror_orders() {
        let newest = names(&GalleryQuery::new("", SortOption::Newest));
        let mut oldest = names(&GalleryQuery::new("", SortOption::Oldest));
        assert_eq!(newest, ["Quiet Coffee", "The Adventurer", "Urban Echo"]);
        oldest.reverse();
        assert_eq!(newest, oldest);
    }

    #[test]
    fn sort_option_parses_known_values() {
        assert_eq!(" Newest ".parse::<SortOption>(), Ok(SortOption::Newest));
        assert!("random".parse::<SortOption>().is_err());
        assert_eq!(SortOption::default(), SortOption::Votes);
    }
}
