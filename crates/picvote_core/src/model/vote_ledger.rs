//! Vote ledger for the local user.
//!
//! # Invariants
//! - An id appears at most once.
//! - Ids are never removed; votes are final.
//! - One ledger total, not partitioned by user identity.

use crate::model::candidate::CandidateId;
use serde::{Deserialize, Deserializer, Serialize};

/// Set of candidate ids the local user has voted for, in vote order.
///
/// Serialized as `{"hasVotedFor": [...]}` to match stored `voteState`
/// records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteLedger {
    has_voted_for: Vec<CandidateId>,
}

impl<'de> Deserialize<'de> for VoteLedger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            has_voted_for: Vec<CandidateId>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Self::from_ids(raw.has_voted_for))
    }
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger, dropping repeated ids.
    pub fn from_ids(ids: impl IntoIterator<Item = CandidateId>) -> Self {
        let mut ledger = Self::new();
        for id in ids {
            ledger.cast_vote(&id);
        }
        ledger
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.has_voted_for.iter().any(|voted| voted == id)
    }

    /// Records a vote. Returns `false` without touching state when `id` is
    /// already present.
    pub fn cast_vote(&mut self, id: &str) -> bool {
        if self.has_voted(id) {
            return false;
        }
        self.has_voted_for.push(id.to_string());
        true
    }

    pub fn voted_ids(&self) -> &[CandidateId] {
        &self.has_voted_for
    }

    pub fn len(&self) -> usize {
        self.has_voted_for.len()
    }

    pub fn is_empty(&self) -> bool {
        self.has_voted_for.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::VoteLedger;

    #[test]
    fn cast_vote_is_idempotent() {
        let mut ledger = VoteLedger::new();
        assert!(ledger.cast_vote("1"));
        assert!(!ledger.cast_vote("1"));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.has_voted("1"));
        assert!(!ledger.has_voted("2"));
    }

    #[test]
    fn deserialize_drops_duplicate_ids() {
        let ledger: VoteLedger =
            serde_json::from_str(r#"{"hasVotedFor":["2","1","2"]}"#).expect("valid ledger json");
        assert_eq!(ledger.voted_ids(), ["2".to_string(), "1".to_string()]);
    }

    #[test]
    fn serializes_with_stored_field_name() {
        let ledger = VoteLedger::from_ids(["3".to_string()]);
        let json = serde_json::to_string(&ledger).expect("ledger serializes");
        assert_eq!(json, r#"{"hasVotedFor":["3"]}"#);
    }
}
