//! Plain-text renderers for terminal output.

use picvote_core::{
    CandidateCard, CardRenderer, GallerySnapshot, Modal, ModalRenderer, ProfileView,
    SessionState,
};
use std::fmt::Write;

/// Renders gallery widgets as terminal lines.
pub struct TextRenderer;

impl CardRenderer for TextRenderer {
    type Output = String;

    fn render_card(&self, card: &CandidateCard) -> String {
        let candidate = &card.candidate;
        let marker = if card.has_voted { "*" } else { " " };
        let badge = card.vibe_badge().unwrap_or_else(|| "-".to_string());
        format!(
            "{marker} [{}] {} | {} votes | {} | #{}",
            candidate.id,
            candidate.name,
            candidate.votes,
            badge,
            candidate.tags.join(" #")
        )
    }
}

impl ModalRenderer for TextRenderer {
    type Output = String;

    fn render_modal(&self, modal: &Modal) -> String {
        match modal {
            Modal::Login {
                authenticating: true,
            } => "signing in...".to_string(),
            Modal::Login {
                authenticating: false,
            } => "sign in to vote".to_string(),
            Modal::Upload { analyzing } => format!("analyzing {analyzing} submission(s)..."),
        }
    }
}

impl TextRenderer {
    pub fn render_gallery(&self, snapshot: &GallerySnapshot) -> String {
        let mut out = String::new();
        let session = match &snapshot.session {
            SessionState::Authenticated(user) => format!("@{}", user.handle),
            other => other.label().to_string(),
        };
        let _ = writeln!(
            out,
            "gallery ({} entries, sort={}, session={})",
            snapshot.gallery_count, snapshot.query.sort, session
        );
        if let Some(modal) = snapshot.modal.as_ref() {
            let _ = writeln!(out, "{}", self.render_modal(modal));
        }

        let leaders: Vec<&str> = snapshot
            .leaderboard
            .iter()
            .map(|candidate| candidate.name.as_str())
            .collect();
        let _ = writeln!(out, "top: {}", leaders.join(", "));

        if snapshot.cards.is_empty() {
            let _ = writeln!(out, "no candidates match `{}`", snapshot.query.text);
        }
        for card in &snapshot.cards {
            let _ = writeln!(out, "{}", self.render_card(card));
        }
        out
    }

    pub fn render_profile(&self, profile: &ProfileView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} (@{})", profile.user.name, profile.user.handle);
        if profile.voted.is_empty() {
            let _ = writeln!(out, "no votes yet");
        }
        for card in &profile.voted {
            let _ = writeln!(out, "{}", self.render_card(card));
        }
        out
    }
}
