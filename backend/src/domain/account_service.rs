//! Account service: merges identity-store sessions with profile rows.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AccountCommand, AuthenticatedAccount, IdentityStore, IdentityStoreError,
    UserPersistenceError, UserProfileRepository,
};
use crate::domain::{
    LoginCredentials, ProfileUpdate, Registration, SessionError, SessionToken, User, UserId,
};

fn map_sign_in_error(error: IdentityStoreError) -> SessionError {
    match error {
        IdentityStoreError::InvalidCredentials => SessionError::auth("Invalid login credentials"),
        IdentityStoreError::Unavailable { message } => SessionError::unavailable(message),
        other => SessionError::auth(other.to_string()),
    }
}

fn map_sign_up_error(error: IdentityStoreError) -> SessionError {
    match error {
        IdentityStoreError::DuplicateEmail { .. } => {
            SessionError::registration("User already registered")
        }
        IdentityStoreError::Unavailable { message } => SessionError::unavailable(message),
        other => SessionError::registration(other.to_string()),
    }
}

fn map_identity_error(error: IdentityStoreError) -> SessionError {
    match error {
        IdentityStoreError::Unavailable { message } => SessionError::unavailable(message),
        other => SessionError::storage(other.to_string()),
    }
}

fn map_profile_error(error: UserPersistenceError) -> SessionError {
    match error {
        UserPersistenceError::Connection { message } => SessionError::unavailable(message),
        UserPersistenceError::DuplicateEmail { .. } => {
            SessionError::registration("User already registered")
        }
        other => SessionError::storage(other.to_string()),
    }
}

/// Account use-cases over an identity store and a profile repository.
#[derive(Clone)]
pub struct AccountService<I, P> {
    identity: Arc<I>,
    profiles: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<I, P> AccountService<I, P> {
    /// Create a service over the given adapters.
    pub fn new(identity: Arc<I>, profiles: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            identity,
            profiles,
            clock,
        }
    }
}

impl<I, P> AccountService<I, P>
where
    I: IdentityStore,
    P: UserProfileRepository,
{
    /// Drop a session we will not hand out; failures only get logged.
    async fn discard_session(&self, token: &SessionToken) {
        if let Err(error) = self.identity.sign_out(token).await {
            warn!(%error, "failed to discard identity session");
        }
    }

    async fn load_active_profile(&self, user_id: &UserId) -> Result<User, SessionError> {
        let user = self
            .profiles
            .find_by_id(user_id)
            .await
            .map_err(|err| SessionError::auth(err.to_string()))?
            .ok_or_else(|| SessionError::auth("User profile not found"))?;
        if !user.is_active() {
            return Err(SessionError::auth("Account is deactivated"));
        }
        Ok(user)
    }
}

#[async_trait]
impl<I, P> AccountCommand for AccountService<I, P>
where
    I: IdentityStore,
    P: UserProfileRepository,
{
    async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedAccount, SessionError> {
        let session = self
            .identity
            .sign_in(credentials)
            .await
            .map_err(map_sign_in_error)?;
        match self.load_active_profile(&session.identity.user_id).await {
            Ok(user) => {
                info!(user_id = %user.id(), "user signed in");
                Ok(AuthenticatedAccount {
                    user,
                    token: session.token,
                })
            }
            Err(error) => {
                self.discard_session(&session.token).await;
                Err(error)
            }
        }
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<AuthenticatedAccount, SessionError> {
        let session = self
            .identity
            .sign_up(registration)
            .await
            .map_err(map_sign_up_error)?;
        let user = User::from_registration(
            session.identity.user_id,
            registration,
            self.clock.utc(),
        );
        if let Err(error) = self.profiles.insert(&user).await {
            self.discard_session(&session.token).await;
            if let Err(rollback) = self.identity.delete_identity(user.id()).await {
                warn!(
                    error = %rollback,
                    user_id = %user.id(),
                    "identity left without a profile after failed registration"
                );
            }
            return Err(map_profile_error(error));
        }
        info!(user_id = %user.id(), "resident registered");
        Ok(AuthenticatedAccount {
            user,
            token: session.token,
        })
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), SessionError> {
        self.identity
            .sign_out(token)
            .await
            .map_err(map_identity_error)
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, SessionError> {
        let current = self
            .profiles
            .find_by_id(user_id)
            .await
            .map_err(map_profile_error)?
            .ok_or_else(|| SessionError::auth("User profile not found"))?;
        let updated = current.apply(update.clone(), self.clock.utc());
        let written = self
            .profiles
            .update_profile(&updated)
            .await
            .map_err(map_profile_error)?;
        if !written {
            return Err(SessionError::auth("User profile not found"));
        }
        Ok(updated)
    }

    async fn resume(&self, token: &SessionToken) -> Result<Option<User>, SessionError> {
        Ok(self.session_user(token).await?.filter(User::is_active))
    }

    async fn session_user(&self, token: &SessionToken) -> Result<Option<User>, SessionError> {
        let Some(identity) = self
            .identity
            .session(token)
            .await
            .map_err(map_identity_error)?
        else {
            return Ok(None);
        };
        self.profiles
            .find_by_id(&identity.user_id)
            .await
            .map_err(map_profile_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
