//! Session state and identity collaborator.
//!
//! # Responsibility
//! - Model the `anonymous -> authenticating -> authenticated` lifecycle.
//! - Define the identity provider contract and its simulated implementation.
//!
//! # Invariants
//! - At most one active user.
//! - `authenticating` is only entered from `anonymous`.
//! - A failed authentication returns to `anonymous`.

use crate::model::user::User;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Delay of the simulated sign-in round trip.
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(1500);

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The identity provider rejected or could not complete sign-in.
    AuthFailed(String),
    /// A sign-in is already running.
    AlreadyAuthenticating,
    /// A user is already signed in.
    AlreadyAuthenticated,
    /// The session left `authenticating` before the provider answered.
    Interrupted,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthFailed(message) => write!(f, "authentication failed: {message}"),
            Self::AlreadyAuthenticating => write!(f, "authentication already in progress"),
            Self::AlreadyAuthenticated => write!(f, "a user is already signed in"),
            Self::Interrupted => write!(f, "sign-in was interrupted by logout"),
        }
    }
}

impl Error for AuthError {}

/// Session lifecycle of the single local user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_authenticating(&self) -> bool {
        matches!(self, Self::Authenticating)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self) -> Result<User, AuthError>;
}

/// Simulated social sign-in returning a fixed identity after a delay.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    delay: Duration,
}

impl MockIdentityProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Identity returned by every simulated sign-in.
    pub fn fixed_user() -> User {
        User {
            id: "x_user_123".to_string(),
            name: "Creative Soul".to_string(),
            handle: "creativesoul_art".to_string(),
            avatar: "https://api.dicebear.com/7.x/avataaars/svg?seed=Felix".to_string(),
        }
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_DELAY)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(&self) -> Result<User, AuthError> {
        tokio::time::sleep(self.delay).await;
        Ok(Self::fixed_user())
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityProvider, MockIdentityProvider, SessionState};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn mock_provider_returns_fixed_identity_after_delay() {
        let provider = MockIdentityProvider::new(Duration::from_millis(1500));
        let started = tokio::time::Instant::now();
        let user = provider.authenticate().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(user.handle, "creativesoul_art");
        assert_eq!(user.id, "x_user_123");
    }

    #[test]
    fn session_state_reports_user_only_when_authenticated() {
        assert!(SessionState::Anonymous.user().is_none());
        assert!(SessionState::Authenticating.user().is_none());
        let state = SessionState::Authenticated(MockIdentityProvider::fixed_user());
        assert_eq!(state.user().map(|u| u.name.as_str()), Some("Creative Soul"));
        assert_eq!(state.label(), "authenticated");
    }
}
