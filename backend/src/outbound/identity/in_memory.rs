//! Process-local identity store with salted SHA-256 password digests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::ports::{Identity, IdentitySession, IdentityStore, IdentityStoreError};
use crate::domain::{Email, LoginCredentials, Registration, SessionToken, UserId};

const SALT_BYTES: usize = 16;
const TOKEN_BYTES: usize = 32;

struct StoredIdentity {
    user_id: UserId,
    email: Email,
    salt: [u8; SALT_BYTES],
    digest: String,
}

#[derive(Default)]
struct Inner {
    by_email: HashMap<String, StoredIdentity>,
    sessions: HashMap<String, Identity>,
}

/// Identity store kept in memory.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    inner: Mutex<Inner>,
}

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn random_token() -> SessionToken {
    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    SessionToken::new(hex::encode(bytes))
}

impl InMemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an identity with a known id, e.g. for seeded staff accounts.
    pub fn with_account(self, user_id: UserId, email: Email, password: &str) -> Self {
        self.store(user_id, email, password);
        self
    }

    fn store(&self, user_id: UserId, email: Email, password: &str) {
        let mut salt = [0_u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);
        let stored = StoredIdentity {
            user_id,
            email: email.clone(),
            salt,
            digest: digest(&salt, password),
        };
        self.lock().by_email.insert(email.as_ref().to_owned(), stored);
    }

    fn open_session(&self, identity: Identity) -> IdentitySession {
        let token = random_token();
        self.lock()
            .sessions
            .insert(token.expose().to_owned(), identity.clone());
        IdentitySession { identity, token }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<IdentitySession, IdentityStoreError> {
        let identity = {
            let inner = self.lock();
            let stored = inner
                .by_email
                .get(credentials.email().as_ref())
                .ok_or(IdentityStoreError::InvalidCredentials)?;
            if digest(&stored.salt, credentials.password()) != stored.digest {
                return Err(IdentityStoreError::InvalidCredentials);
            }
            Identity {
                user_id: stored.user_id,
                email: stored.email.clone(),
            }
        };
        Ok(self.open_session(identity))
    }

    async fn sign_up(
        &self,
        registration: &Registration,
    ) -> Result<IdentitySession, IdentityStoreError> {
        let email = registration.email();
        if self.lock().by_email.contains_key(email.as_ref()) {
            return Err(IdentityStoreError::duplicate_email(email.as_ref()));
        }
        let user_id = UserId::random();
        self.store(user_id, email.clone(), registration.password());
        Ok(self.open_session(Identity {
            user_id,
            email: email.clone(),
        }))
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityStoreError> {
        self.lock().sessions.remove(token.expose());
        Ok(())
    }

    async fn session(&self, token: &SessionToken) -> Result<Option<Identity>, IdentityStoreError> {
        Ok(self.lock().sessions.get(token.expose()).cloned())
    }

    async fn delete_identity(&self, user_id: &UserId) -> Result<(), IdentityStoreError> {
        let mut inner = self.lock();
        inner.by_email.retain(|_, stored| stored.user_id != *user_id);
        inner
            .sessions
            .retain(|_, identity| identity.user_id != *user_id);
        Ok(())
    }
}
