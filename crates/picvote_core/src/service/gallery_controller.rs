//! Gallery view controller.
//!
//! # Responsibility
//! - Own the application state: registry, ledger, session, view and filters.
//! - Dispatch vote, submit, login and logout actions.
//! - Write each changed record back through the injected [`StateStore`].
//!
//! # Invariants
//! - A recorded vote changes the ledger and the registry together, or neither.
//! - Anonymous votes open the login prompt and change nothing else.
//! - Only the most recent sign-in attempt may complete; logout voids it.
//! - A submission creates exactly one candidate, after analysis resolves.
//! - Storage failures are logged and never surface to callers.

use crate::analysis::{analyze_or_fallback, Analysis, ImageAnalyzer, ImagePayload};
use crate::model::candidate::{Candidate, CandidateValidationError, NewCandidate};
use crate::model::registry::{now_epoch_ms, CandidateRegistry};
use crate::model::seed::seed_candidates;
use crate::model::user::User;
use crate::model::vote_ledger::VoteLedger;
use crate::repo::state_repo::{
    RepoResult, StateStore, CANDIDATES_KEY, CURRENT_USER_KEY, VOTE_STATE_KEY,
};
use crate::search::filter::{GalleryQuery, SortOption};
use crate::session::{AuthError, IdentityProvider, SessionState};
use crate::view::{CandidateCard, Modal, ProfileView, View};
use log::{error, info, warn};

/// Number of entries on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 3;

/// Result of a vote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote counted; carries the new total.
    Recorded { votes: u64 },
    /// Ledger already holds this id; nothing changed.
    AlreadyVoted,
    /// No active session; the login prompt was opened instead.
    LoginRequired,
    /// Id not in the registry; nothing changed.
    UnknownCandidate,
}

/// Identifies one sign-in attempt started by [`GalleryController::begin_login`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTicket(u64);

/// Upload form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub name: String,
    pub description: String,
    pub image: ImagePayload,
}

impl SubmissionDraft {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: ImagePayload,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image,
        }
    }

    /// Name and image are required before analysis starts.
    pub fn validate(&self) -> Result<(), CandidateValidationError> {
        if self.name.trim().is_empty() {
            return Err(CandidateValidationError::EmptyName);
        }
        if self.image.is_empty() {
            return Err(CandidateValidationError::EmptyImage);
        }
        Ok(())
    }

    fn into_new_candidate(self, analysis: Analysis) -> NewCandidate {
        NewCandidate {
            name: self.name,
            description: self.description,
            image_url: self.image.as_str().to_string(),
            vibe_score: Some(analysis.vibe_score),
            ai_critique: Some(analysis.critique),
            tags: analysis.tags,
        }
    }
}

/// Single-owner application state with persistence write-back.
pub struct GalleryController<S: StateStore> {
    store: S,
    registry: CandidateRegistry,
    ledger: VoteLedger,
    session: SessionState,
    view: View,
    query: GalleryQuery,
    login_prompt_open: bool,
    welcome_notice: Option<String>,
    pending_submissions: usize,
    login_generation: u64,
}

impl<S: StateStore> GalleryController<S> {
    /// Loads all three records once, substituting defaults for missing or
    /// unreadable ones.
    pub fn load(store: S) -> Self {
        Self::load_at(store, now_epoch_ms())
    }

    /// Same as [`Self::load`] with an explicit clock for seed timestamps.
    pub fn load_at(store: S, now_ms: i64) -> Self {
        let candidates = load_or_default(CANDIDATES_KEY, store.load_candidates())
            .unwrap_or_else(|| seed_candidates(now_ms));
        let ledger = load_or_default(VOTE_STATE_KEY, store.load_vote_ledger()).unwrap_or_default();
        let session = match load_or_default(CURRENT_USER_KEY, store.load_current_user()) {
            Some(user) => SessionState::Authenticated(user),
            None => SessionState::Anonymous,
        };

        info!(
            "event=state_load module=controller status=ok candidates={} votes={} session={}",
            candidates.len(),
            ledger.len(),
            session.label()
        );

        Self {
            store,
            registry: CandidateRegistry::from_candidates(candidates),
            ledger,
            session,
            view: View::Gallery,
            query: GalleryQuery::default(),
            login_prompt_open: false,
            welcome_notice: None,
            pending_submissions: 0,
            login_generation: 0,
        }
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn query(&self) -> &GalleryQuery {
        &self.query
    }

    pub fn login_prompt_open(&self) -> bool {
        self.login_prompt_open
    }

    pub fn pending_submissions(&self) -> usize {
        self.pending_submissions
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.ledger.has_voted(id)
    }

    /// Total number of entries, regardless of filters.
    pub fn gallery_count(&self) -> usize {
        self.registry.len()
    }

    /// Filtered and sorted gallery for the current search text and sort.
    pub fn visible_candidates(&self) -> Vec<Candidate> {
        self.registry.filter_and_sort(&self.query.text, self.query.sort)
    }

    /// Card projections of [`Self::visible_candidates`].
    pub fn visible_cards(&self) -> Vec<CandidateCard> {
        self.visible_candidates()
            .into_iter()
            .map(|candidate| self.card(candidate))
            .collect()
    }

    pub fn leaderboard(&self) -> Vec<Candidate> {
        self.registry.leaderboard(LEADERBOARD_SIZE)
    }

    pub fn set_search_query(&mut self, text: impl Into<String>) {
        self.query.text = text.into();
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.query.sort = sort;
    }

    /// Clears search text and restores vote ordering.
    pub fn reset_filters(&mut self) {
        self.query = GalleryQuery::default();
    }

    /// Casts one vote for `id`.
    ///
    /// Anonymous requests open the login prompt instead of voting.
    pub fn vote(&mut self, id: &str) -> VoteOutcome {
        if !self.session.is_authenticated() {
            self.login_prompt_open = true;
            info!("event=vote module=controller status=ignored reason=login_required");
            return VoteOutcome::LoginRequired;
        }
        if self.ledger.has_voted(id) {
            info!(
                "event=vote module=controller status=ignored reason=already_voted candidate_id={id}"
            );
            return VoteOutcome::AlreadyVoted;
        }
        if !self.registry.contains(id) {
            warn!(
                "event=vote module=controller status=ignored reason=unknown_candidate candidate_id={id}"
            );
            return VoteOutcome::UnknownCandidate;
        }

        let Some(votes) = self.registry.record_vote(id) else {
            return VoteOutcome::UnknownCandidate;
        };
        self.ledger.cast_vote(id);
        info!("event=vote module=controller status=ok candidate_id={id} votes={votes}");

        self.persist_candidates();
        self.persist_ledger();
        VoteOutcome::Recorded { votes }
    }

    /// Opens the login prompt.
    pub fn request_login(&mut self) {
        if !self.session.is_authenticated() {
            self.login_prompt_open = true;
        }
    }

    pub fn dismiss_login_prompt(&mut self) {
        if !self.session.is_authenticating() {
            self.login_prompt_open = false;
        }
    }

    /// Moves `anonymous -> authenticating` and returns the ticket the
    /// provider result must be presented with.
    pub fn begin_login(&mut self) -> Result<LoginTicket, AuthError> {
        match self.session {
            SessionState::Anonymous => {
                self.login_generation += 1;
                self.session = SessionState::Authenticating;
                self.login_prompt_open = true;
                info!(
                    "event=login module=controller status=start attempt={}",
                    self.login_generation
                );
                Ok(LoginTicket(self.login_generation))
            }
            SessionState::Authenticating => Err(AuthError::AlreadyAuthenticating),
            SessionState::Authenticated(_) => Err(AuthError::AlreadyAuthenticated),
        }
    }

    /// Applies the identity provider result of the attempt `ticket` names.
    ///
    /// A result for a voided or superseded attempt (logout during sign-in,
    /// then a new sign-in) is discarded as `Interrupted`.
    pub fn complete_login(
        &mut self,
        ticket: LoginTicket,
        result: Result<User, AuthError>,
    ) -> Result<User, AuthError> {
        if !self.session.is_authenticating() || ticket.0 != self.login_generation {
            warn!(
                "event=login module=controller status=ignored reason=stale_attempt attempt={}",
                ticket.0
            );
            return Err(AuthError::Interrupted);
        }

        match result {
            Ok(user) => {
                self.session = SessionState::Authenticated(user.clone());
                self.login_prompt_open = false;
                self.welcome_notice = Some(format!("Welcome back, @{}", user.handle));
                info!("event=login module=controller status=ok user_id={}", user.id);
                self.persist_user();
                Ok(user)
            }
            Err(err) => {
                self.session = SessionState::Anonymous;
                warn!("event=login module=controller status=error error={err}");
                Err(err)
            }
        }
    }

    /// Runs a full sign-in against `provider`.
    pub async fn login(&mut self, provider: &dyn IdentityProvider) -> Result<User, AuthError> {
        let ticket = self.begin_login()?;
        let result = provider.authenticate().await;
        self.complete_login(ticket, result)
    }

    /// Clears the identity and returns to the gallery.
    ///
    /// Ledger and registry are untouched.
    pub fn logout(&mut self) {
        let was = self.session.label();
        self.login_generation += 1;
        self.session = SessionState::Anonymous;
        self.view = View::Gallery;
        self.welcome_notice = None;
        self.login_prompt_open = false;
        info!("event=logout module=controller status=ok previous_session={was}");
        self.persist_user();
    }

    /// One-shot welcome message set by a successful login.
    pub fn take_welcome_notice(&mut self) -> Option<String> {
        self.welcome_notice.take()
    }

    /// Switches to the profile view. Requires an authenticated session.
    pub fn open_profile(&mut self) -> bool {
        if !self.session.is_authenticated() {
            return false;
        }
        self.view = View::Profile;
        true
    }

    pub fn show_gallery(&mut self) {
        self.view = View::Gallery;
    }

    /// Profile projection for the signed-in user.
    pub fn profile(&self) -> Option<ProfileView> {
        let user = self.session.user()?.clone();
        let voted = self
            .registry
            .candidates()
            .iter()
            .filter(|candidate| self.ledger.has_voted(&candidate.id))
            .cloned()
            .map(|candidate| self.card(candidate))
            .collect();
        Some(ProfileView { user, voted })
    }

    /// Modal to show, if any: sign-in takes precedence over upload.
    pub fn active_modal(&self) -> Option<Modal> {
        if self.login_prompt_open || self.session.is_authenticating() {
            return Some(Modal::Login {
                authenticating: self.session.is_authenticating(),
            });
        }
        if self.pending_submissions > 0 {
            return Some(Modal::Upload {
                analyzing: self.pending_submissions,
            });
        }
        None
    }

    /// Validates a draft and marks it as awaiting analysis.
    pub fn begin_submission(
        &mut self,
        draft: &SubmissionDraft,
    ) -> Result<(), CandidateValidationError> {
        draft.validate()?;
        self.pending_submissions += 1;
        info!(
            "event=submit module=controller status=start pending={}",
            self.pending_submissions
        );
        Ok(())
    }

    /// Creates the candidate once analysis (or its fallback) is available.
    pub fn finish_submission(
        &mut self,
        draft: SubmissionDraft,
        analysis: Analysis,
    ) -> Result<Candidate, CandidateValidationError> {
        self.pending_submissions = self.pending_submissions.saturating_sub(1);
        let created = self
            .registry
            .submit(draft.into_new_candidate(analysis), now_epoch_ms());
        match &created {
            Ok(candidate) => {
                info!(
                    "event=submit module=controller status=ok candidate_id={} vibe_score={}",
                    candidate.id,
                    candidate.vibe_score.unwrap_or_default()
                );
                self.persist_candidates();
            }
            Err(err) => {
                warn!("event=submit module=controller status=error error={err}");
            }
        }
        created
    }

    /// Analyzes and submits in one call.
    ///
    /// Analyzer failures resolve to the fallback result; only a draft
    /// without name or image is rejected.
    pub async fn submit(
        &mut self,
        draft: SubmissionDraft,
        analyzer: &dyn ImageAnalyzer,
    ) -> Result<Candidate, CandidateValidationError> {
        self.begin_submission(&draft)?;
        let analysis = analyze_or_fallback(analyzer, &draft.image).await;
        self.finish_submission(draft, analysis)
    }

    fn card(&self, candidate: Candidate) -> CandidateCard {
        let has_voted = self.ledger.has_voted(&candidate.id);
        CandidateCard {
            candidate,
            has_voted,
        }
    }

    fn persist_candidates(&self) {
        log_persist(CANDIDATES_KEY, self.store.save_candidates(self.registry.candidates()));
    }

    fn persist_ledger(&self) {
        log_persist(VOTE_STATE_KEY, self.store.save_vote_ledger(&self.ledger));
    }

    fn persist_user(&self) {
        log_persist(CURRENT_USER_KEY, self.store.save_current_user(self.session.user()));
    }
}

fn load_or_default<T>(key: &str, loaded: RepoResult<Option<T>>) -> Option<T> {
    match loaded {
        Ok(value) => value,
        Err(err) => {
            warn!("event=state_load module=controller status=fallback key={key} error={err}");
            None
        }
    }
}

fn log_persist(key: &str, result: RepoResult<()>) {
    if let Err(err) = result {
        error!("event=state_persist module=controller status=error key={key} error={err}");
    }
}
