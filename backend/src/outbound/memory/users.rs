//! In-memory [`UserProfileRepository`].

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserProfileRepository};
use crate::domain::{User, UserId};

use super::lock;

/// Map-backed profile store.
#[derive(Debug, Default)]
pub struct InMemoryUserProfileRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserProfileRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserProfileRepository for InMemoryUserProfileRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = lock(&self.users);
        if users.values().any(|held| held.email() == user.email()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        users.insert(*user.id(), user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut users = lock(&self.users);
        match users.get_mut(user.id()) {
            Some(held) => {
                *held = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.users).get(id).cloned())
    }

    async fn count(&self) -> Result<u64, UserPersistenceError> {
        Ok(lock(&self.users).len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::users::resident;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn duplicate_emails_are_refused() {
        let repo = InMemoryUserProfileRepository::new();
        repo.insert(&resident()).await.expect("insert");
        let err = repo.insert(&resident()).await.expect_err("duplicate");
        assert_eq!(err, UserPersistenceError::duplicate_email("juan@example.ph"));
        assert_eq!(repo.count().await.expect("count"), 1);
    }
}
