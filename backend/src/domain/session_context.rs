//! Process-wide authentication state for a portal client.
//!
//! `SessionContext` owns the signed-in user and the loading phase. Mutations
//! are serialised by an async mutex that also guards the session token, and
//! readers observe snapshots through a `watch` channel, so nobody sees a
//! token persisted without its user or the other way round.
//!
//! The cached user and token live in [`DurableStorage`] under [`USER_KEY`] and
//! [`TOKEN_KEY`]; [`SessionContext::restore`] reads them back once at start-up.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, OnceCell, watch};
use tracing::{debug, info, warn};

use crate::domain::ports::{AccountCommand, AuthenticatedAccount, DurableStorage};
use crate::domain::{
    LoginCredentials, ProfileUpdate, ProfileUpdateDraft, Registration, RegistrationDraft,
    SessionError, SessionState, SessionToken, User,
};

/// Storage key for the cached user.
pub const USER_KEY: &str = "user";
/// Storage key for the cached session token.
pub const TOKEN_KEY: &str = "token";

/// Authentication state shared by everything in one client process.
pub struct SessionContext<A, S> {
    accounts: Arc<A>,
    storage: Arc<S>,
    token: Mutex<Option<SessionToken>>,
    state: watch::Sender<SessionState>,
    restored: OnceCell<()>,
}

impl<A, S> SessionContext<A, S>
where
    A: AccountCommand,
    S: DurableStorage,
{
    /// Create an unresolved context; call [`Self::restore`] next.
    pub fn new(accounts: Arc<A>, storage: Arc<S>) -> Self {
        let (state, _) = watch::channel(SessionState::Unresolved);
        Self {
            accounts,
            storage,
            token: Mutex::new(None),
            state,
            restored: OnceCell::new(),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// `true` until restoration has finished.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Receive every future state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Rehydrate the session from durable storage.
    ///
    /// Only the first call does any work; later calls wait for it. Failures
    /// clear the cache and leave the context anonymous.
    pub async fn restore(&self) {
        self.restored.get_or_init(|| self.restore_inner()).await;
    }

    async fn restore_inner(&self) {
        let mut held = self.token.lock().await;
        if !self.state.borrow().is_loading() {
            debug!("session already resolved before restore");
            return;
        }
        let token = match self.storage.get(TOKEN_KEY).await {
            Ok(value) => value.and_then(token_from_value),
            Err(error) => {
                warn!(%error, "failed to read cached session token");
                None
            }
        };
        let Some(token) = token else {
            self.clear_storage().await;
            self.state.send_replace(SessionState::Anonymous);
            return;
        };
        match self.accounts.resume(&token).await {
            Ok(Some(user)) => {
                if let Err(error) = self.persist_user(&user).await {
                    warn!(%error, "failed to refresh cached user");
                }
                info!(user_id = %user.id(), "session restored");
                *held = Some(token);
                self.state.send_replace(SessionState::Authenticated(user));
            }
            Ok(None) => {
                debug!("cached session no longer valid");
                self.clear_storage().await;
                self.state.send_replace(SessionState::Anonymous);
            }
            Err(error) => {
                warn!(%error, "session restore failed");
                self.clear_storage().await;
                self.state.send_replace(SessionState::Anonymous);
            }
        }
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        let mut held = self.token.lock().await;
        let account = self.accounts.login(&credentials).await?;
        self.establish(&mut held, account).await
    }

    /// Create a resident account and sign it in.
    pub async fn register(&self, draft: RegistrationDraft) -> Result<User, SessionError> {
        let registration = Registration::try_from(draft)?;
        let mut held = self.token.lock().await;
        let account = self.accounts.register(&registration).await?;
        self.establish(&mut held, account).await
    }

    /// Sign out. Never fails; the context is anonymous afterwards.
    pub async fn logout(&self) {
        let mut held = self.token.lock().await;
        if let Some(token) = held.take() {
            self.end_remote_session(&token).await;
        }
        self.clear_storage().await;
        self.state.send_replace(SessionState::Anonymous);
        info!("signed out");
    }

    /// Update the signed-in user's profile.
    ///
    /// Returns `Ok(None)` when nobody is signed in.
    pub async fn update_user(
        &self,
        draft: ProfileUpdateDraft,
    ) -> Result<Option<User>, SessionError> {
        let _held = self.token.lock().await;
        let Some(current) = self.current_user() else {
            return Ok(None);
        };
        let update = ProfileUpdate::try_from(draft)?;
        let updated = self.accounts.update_profile(current.id(), &update).await?;
        self.persist_user(&updated).await?;
        self.state
            .send_replace(SessionState::Authenticated(updated.clone()));
        Ok(Some(updated))
    }

    /// Adopt a freshly issued session.
    ///
    /// Any session already held is ended remotely first. The token is cached
    /// before the user; if either write fails the new session is ended too,
    /// the cache is cleared and the context is left anonymous.
    async fn establish(
        &self,
        held: &mut Option<SessionToken>,
        account: AuthenticatedAccount,
    ) -> Result<User, SessionError> {
        let AuthenticatedAccount { user, token } = account;
        if let Some(previous) = held.take() {
            if previous != token {
                debug!("replacing an existing session");
                self.end_remote_session(&previous).await;
            }
        }
        if let Err(error) = self.persist_session(&token, &user).await {
            warn!(%error, user_id = %user.id(), "failed to cache session; signing out");
            self.end_remote_session(&token).await;
            self.clear_storage().await;
            self.state.send_replace(SessionState::Anonymous);
            return Err(error);
        }
        *held = Some(token);
        self.state.send_replace(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    async fn persist_session(
        &self,
        token: &SessionToken,
        user: &User,
    ) -> Result<(), SessionError> {
        let token_value = Value::String(token.expose().to_owned());
        self.storage
            .set(TOKEN_KEY, &token_value)
            .await
            .map_err(|err| SessionError::storage(err.to_string()))?;
        self.persist_user(user).await
    }

    async fn end_remote_session(&self, token: &SessionToken) {
        if let Err(error) = self.accounts.logout(token).await {
            warn!(%error, "remote sign-out failed");
        }
    }

    async fn persist_user(&self, user: &User) -> Result<(), SessionError> {
        let value =
            serde_json::to_value(user).map_err(|err| SessionError::storage(err.to_string()))?;
        self.storage
            .set(USER_KEY, &value)
            .await
            .map_err(|err| SessionError::storage(err.to_string()))
    }

    async fn clear_storage(&self) {
        for key in [USER_KEY, TOKEN_KEY] {
            if let Err(error) = self.storage.remove(key).await {
                warn!(%error, key, "failed to clear cached session entry");
            }
        }
    }
}

fn token_from_value(value: Value) -> Option<SessionToken> {
    match value {
        Value::String(raw) if !raw.trim().is_empty() => Some(SessionToken::new(raw)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "session_context_tests.rs"]
mod tests;
