//! Core domain logic for PicVote.
//! This crate is the single source of truth for gallery and voting invariants.

pub mod analysis;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;
pub mod view;

pub use analysis::{
    analyze_or_fallback, Analysis, AnalysisError, AnalysisResult, DisabledAnalyzer,
    GeminiAnalyzer, GeminiConfig, ImageAnalyzer, ImagePayload,
};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::candidate::{Candidate, CandidateId, CandidateValidationError, NewCandidate};
pub use model::registry::CandidateRegistry;
pub use model::user::User;
pub use model::vote_ledger::VoteLedger;
pub use repo::state_repo::{RepoError, RepoResult, SqliteStateStore, StateStore};
pub use search::filter::{filter_and_sort, GalleryQuery, SortOption};
pub use service::actor::{spawn_gallery, GalleryClosed, GalleryHandle, GallerySnapshot};
pub use service::gallery_controller::{
    GalleryController, LoginTicket, SubmissionDraft, VoteOutcome,
};
pub use session::{AuthError, IdentityProvider, MockIdentityProvider, SessionState};
pub use view::{CandidateCard, CardRenderer, Modal, ModalRenderer, ProfileView, View};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
