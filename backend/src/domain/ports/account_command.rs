//! Driving port for account use-cases.
//!
//! The session context and the HTTP adapter both authenticate through this
//! port, so neither imports the identity store or the profile repository.

use async_trait::async_trait;

use crate::domain::{
    LoginCredentials, ProfileUpdate, Registration, SessionError, SessionToken, User, UserId,
};

/// A signed-in user with the token for their session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    /// Merged identity and profile.
    pub user: User,
    /// Token to present on later calls.
    pub token: SessionToken,
}

/// Account operations exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Authenticate and load the profile.
    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedAccount, SessionError>;

    /// Create an identity and a resident profile.
    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<AuthenticatedAccount, SessionError>;

    /// Invalidate a session token.
    async fn logout(&self, token: &SessionToken) -> Result<(), SessionError>;

    /// Apply a profile update and return the merged user.
    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, SessionError>;

    /// Resolve a cached token back to an active user; `None` when the session
    /// is gone.
    async fn resume(&self, token: &SessionToken) -> Result<Option<User>, SessionError>;

    /// User behind a live identity-store session, active or not.
    ///
    /// `None` once the token has been signed out or has expired.
    async fn session_user(&self, token: &SessionToken) -> Result<Option<User>, SessionError>;
}
