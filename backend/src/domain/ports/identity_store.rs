//! Driven port for the credential and session-token store.
//!
//! The identity store owns passwords and opaque session tokens. Profile data
//! lives in [`super::UserProfileRepository`]; the account service merges the
//! two.

use async_trait::async_trait;

use crate::domain::{Email, LoginCredentials, Registration, SessionToken, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity store adapters.
    pub enum IdentityStoreError {
        /// Email and password did not match an identity.
        InvalidCredentials => "invalid login credentials",
        /// An identity with this email already exists.
        DuplicateEmail { email: String } => "user already registered: {email}",
        /// The store refused the request.
        Rejected { message: String } => "identity store rejected request: {message}",
        /// The store could not be reached.
        Unavailable { message: String } => "identity store unavailable: {message}",
    }
}

/// Identity known to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Identifier shared with the profile row.
    pub user_id: UserId,
    /// Sign-in email.
    pub email: Email,
}

/// Identity plus the token issued for a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySession {
    /// Signed-in identity.
    pub identity: Identity,
    /// Token to present on later calls.
    pub token: SessionToken,
}

/// Port for credential checks and session tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<IdentitySession, IdentityStoreError>;

    /// Create an identity and open a session for it.
    async fn sign_up(
        &self,
        registration: &Registration,
    ) -> Result<IdentitySession, IdentityStoreError>;

    /// Invalidate a session token.
    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityStoreError>;

    /// Resolve a token to its identity; `None` when unknown or expired.
    async fn session(&self, token: &SessionToken) -> Result<Option<Identity>, IdentityStoreError>;

    /// Remove an identity and its sessions; removing an unknown id succeeds.
    ///
    /// Used to roll back a sign-up whose profile row could not be written.
    async fn delete_identity(&self, user_id: &UserId) -> Result<(), IdentityStoreError>;
}
