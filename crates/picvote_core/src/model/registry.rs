//! Ordered candidate collection.
//!
//! # Responsibility
//! - Own the gallery entries in display-independent storage order.
//! - Assign id, initial vote count and timestamp on submission.
//!
//! # Invariants
//! - New submissions are prepended (most recent first).
//! - Vote counts change by exactly one per `record_vote`.
//! - Submission timestamps are strictly greater than every timestamp already
//!   present, so `newest`/`oldest` ordering is total.
//! - Entries are never removed.

use crate::model::candidate::{Candidate, CandidateValidationError, NewCandidate};
use crate::search::filter::{filter_and_sort, GalleryQuery, SortOption};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// In-memory candidate registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRegistry {
    candidates: Vec<Candidate>,
    last_timestamp: i64,
}

impl CandidateRegistry {
    /// Wraps an already-loaded list, keeping its order.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let last_timestamp = candidates
            .iter()
            .map(|candidate| candidate.timestamp)
            .max()
            .unwrap_or(i64::MIN);
        Self {
            candidates,
            last_timestamp,
        }
    }

    /// Creates a candidate from caller fields and prepends it.
    ///
    /// `now_ms` is bumped forward when it would not be strictly newer than
    /// the latest stored entry.
    pub fn submit(
        &mut self,
        draft: NewCandidate,
        now_ms: i64,
    ) -> Result<Candidate, CandidateValidationError> {
        draft.validate()?;

        let timestamp = if now_ms > self.last_timestamp {
            now_ms
        } else {
            self.last_timestamp.saturating_add(1)
        };
        let id = self.fresh_id();
        let candidate = draft.into_candidate(id, timestamp);

        self.last_timestamp = timestamp;
        self.candidates.insert(0, candidate.clone());
        Ok(candidate)
    }

    /// Increments the vote count of `id` by one.
    ///
    /// Returns the new count, or `None` when the id is unknown (no change).
    pub fn record_vote(&mut self, id: &str) -> Option<u64> {
        let candidate = self
            .candidates
            .iter_mut()
            .find(|candidate| candidate.id == id)?;
        candidate.votes = candidate.votes.saturating_add(1);
        Some(candidate.votes)
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| candidate.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Entries in storage order (newest submissions first).
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Filtered and sorted projection; see [`filter_and_sort`].
    pub fn filter_and_sort(&self, query: &str, sort: SortOption) -> Vec<Candidate> {
        filter_and_sort(&self.candidates, &GalleryQuery::new(query, sort))
    }

    /// Highest-voted entries, ties kept in storage order.
    pub fn leaderboard(&self, limit: usize) -> Vec<Candidate> {
        let mut ranked = self.filter_and_sort("", SortOption::Votes);
        ranked.truncate(limit);
        ranked
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

/// Current wall clock in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::CandidateRegistry;
    use crate::model::candidate::{Candidate, CandidateValidationError, NewCandidate};

    fn entry(id: &str, votes: u64, timestamp: i64) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: format!("entry {id}"),
            image_url: format!("https://example.com/{id}.jpg"),
            votes,
            description: String::new(),
            vibe_score: None,
            ai_critique: None,
            tags: Vec::new(),
            timestamp,
        }
    }

    fn draft(name: &str) -> NewCandidate {
        NewCandidate {
            name: name.to_string(),
            description: String::new(),
            image_url: "data:image/jpeg;base64,AAAA".to_string(),
            vibe_score: Some(85),
            ai_critique: Some("ok".to_string()),
            tags: vec!["Creative".to_string()],
        }
    }

    #[test]
    fn submit_prepends_with_zero_votes() {
        let mut registry = CandidateRegistry::from_candidates(vec![entry("1", 4, 100)]);
        let created = registry.submit(draft("Test Shot"), 200).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.candidates()[0].id, created.id);
        assert_eq!(created.votes, 0);
        assert_eq!(created.timestamp, 200);
    }

    #[test]
    fn submit_bumps_stale_clock_forward() {
        let mut registry = CandidateRegistry::from_candidates(vec![entry("1", 0, 500)]);
        let first = registry.submit(draft("a"), 100).unwrap();
        let second = registry.submit(draft("b"), 100).unwrap();
        assert_eq!(first.timestamp, 501);
        assert_eq!(second.timestamp, 502);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn submit_requires_name_and_image() {
        let mut registry = CandidateRegistry::default();
        let err = registry.submit(draft("  "), 1).unwrap_err();
        assert_eq!(err, CandidateValidationError::EmptyName);

        let mut no_image = draft("named");
        no_image.image_url.clear();
        let err = registry.submit(no_image, 1).unwrap_err();
        assert_eq!(err, CandidateValidationError::EmptyImage);
        assert!(registry.is_empty());
    }

    #[test]
    fn record_vote_increments_by_one_and_ignores_unknown() {
        let mut registry = CandidateRegistry::from_candidates(vec![entry("1", 4, 1)]);
        assert_eq!(registry.record_vote("1"), Some(5));
        assert_eq!(registry.record_vote("missing"), None);
        assert_eq!(registry.get("1").map(|c| c.votes), Some(5));
    }

    #[test]
    fn leaderboard_keeps_top_three_with_stable_ties() {
        let registry = CandidateRegistry::from_candidates(vec![
            entry("a", 1, 1),
            entry("b", 9, 2),
            entry("c", 5, 3),
            entry("d", 5, 4),
        ]);
        let ids: Vec<_> = registry
            .leaderboard(3)
            .into_iter()
            .map(|candidate| candidate.id)
            .collect();
        assert_eq!(ids, ["b", "c", "d"]);
    }
}
