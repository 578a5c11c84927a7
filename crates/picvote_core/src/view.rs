//! Presentation projections and renderer contracts.
//!
//! Widgets receive typed view models instead of loose props: one trait per
//! widget responsibility, implemented by whichever front end hosts the core.

use crate::model::candidate::Candidate;
use crate::model::user::User;

/// Top-level screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Gallery,
    Profile,
}

/// Gallery item view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCard {
    pub candidate: Candidate,
    pub has_voted: bool,
}

impl CandidateCard {
    /// Badge text such as `92% Vibe`, absent for unscored entries.
    pub fn vibe_badge(&self) -> Option<String> {
        self.candidate
            .vibe_score
            .map(|score| format!("{score}% Vibe"))
    }

    /// Vote button is live only for entries not yet voted on.
    pub fn can_vote(&self) -> bool {
        !self.has_voted
    }
}

/// Modal currently shown over the active view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Login { authenticating: bool },
    Upload { analyzing: usize },
}

/// Profile screen view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub user: User,
    /// Voted entries in registry order.
    pub voted: Vec<CandidateCard>,
}

/// Renders one gallery item.
pub trait CardRenderer {
    type Output;

    fn render_card(&self, card: &CandidateCard) -> Self::Output;
}

/// Renders one modal.
pub trait ModalRenderer {
    type Output;

    fn render_modal(&self, modal: &Modal) -> Self::Output;
}

#[cfg(test)]
mod tests {
    use super::CandidateCard;
    use crate::model::seed::seed_candidates;

    #[test]
    fn vibe_badge_formats_percentage() {
        let candidate = seed_candidates(5_000_000).remove(0);
        let card = CandidateCard {
            candidate,
            has_voted: true,
        };
        assert_eq!(card.vibe_badge().as_deref(), Some("92% Vibe"));
        assert!(!card.can_vote());
    }
}
