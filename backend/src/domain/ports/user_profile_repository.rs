//! Port abstraction for resident profile rows and their errors.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by profile repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another profile already uses this email.
        DuplicateEmail { email: String } => "user profile already exists for {email}",
        /// A stored row failed domain validation.
        Corrupt { message: String } => "stored user profile is invalid: {message}",
    }
}

/// Port for reading and writing `users` rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Insert a new profile.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Overwrite the mutable profile fields of an existing row.
    ///
    /// Returns `false` when no row matched.
    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError>;

    /// Fetch a profile by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Number of registered profiles.
    async fn count(&self) -> Result<u64, UserPersistenceError>;
}
