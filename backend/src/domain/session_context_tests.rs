//! Tests for the session context state machine.

use super::*;
use crate::domain::ports::{DurableStorageError, MockAccountCommand, MockDurableStorage};
use crate::outbound::storage::MemoryStorage;
use crate::test_support::users::resident;
use rstest::rstest;
use serde_json::json;

type Context = SessionContext<MockAccountCommand, MemoryStorage>;

fn context(accounts: MockAccountCommand, storage: Arc<MemoryStorage>) -> Context {
    SessionContext::new(Arc::new(accounts), storage)
}

fn signed_in(user: User) -> AuthenticatedAccount {
    AuthenticatedAccount {
        user,
        token: SessionToken::new("token-1"),
    }
}

#[rstest]
#[tokio::test]
async fn starts_loading_until_restored() {
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(MockAccountCommand::new(), storage);
    assert!(ctx.is_loading());
    ctx.restore().await;
    assert!(!ctx.is_loading());
    assert_eq!(ctx.state(), SessionState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn login_persists_then_publishes() {
    let user = resident();
    let mut accounts = MockAccountCommand::new();
    let account = signed_in(user.clone());
    accounts
        .expect_login()
        .times(1)
        .return_once(move |_| Ok(account));
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(accounts, Arc::clone(&storage));
    ctx.restore().await;
    let changes = ctx.subscribe();

    let signed = ctx
        .login("juan@example.ph", "secret1")
        .await
        .expect("login succeeds");

    assert_eq!(signed.email().as_ref(), "juan@example.ph");
    assert_eq!(ctx.current_user(), Some(user));
    assert!(!ctx.is_loading());
    assert!(changes.has_changed().expect("sender alive"));
    assert_eq!(
        storage.get(TOKEN_KEY).await.expect("token read"),
        Some(json!("token-1"))
    );
    assert!(storage.contains(USER_KEY));
}

#[rstest]
#[tokio::test]
async fn invalid_input_is_rejected_before_the_store() {
    let ctx = context(MockAccountCommand::new(), Arc::new(MemoryStorage::new()));
    let err = ctx.login("not-an-email", "secret1").await.expect_err("bad email");
    assert!(matches!(err, SessionError::Validation(_)));
}

#[rstest]
#[tokio::test]
async fn failed_login_leaves_state_untouched() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_login()
        .return_once(|_| Err(SessionError::auth("Invalid login credentials")));
    let ctx = context(accounts, Arc::new(MemoryStorage::new()));
    ctx.restore().await;
    let err = ctx
        .login("juan@example.ph", "wrong-password")
        .await
        .expect_err("login fails");
    assert_eq!(err, SessionError::auth("Invalid login credentials"));
    assert_eq!(ctx.state(), SessionState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn logout_swallows_remote_errors_and_clears_storage() {
    let mut accounts = MockAccountCommand::new();
    let account = signed_in(resident());
    accounts.expect_login().return_once(move |_| Ok(account));
    accounts
        .expect_logout()
        .times(1)
        .return_once(|_| Err(SessionError::unavailable("identity store down")));
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(accounts, Arc::clone(&storage));
    ctx.login("juan@example.ph", "secret1")
        .await
        .expect("login succeeds");

    ctx.logout().await;

    assert!(ctx.current_user().is_none());
    assert!(!storage.contains(USER_KEY));
    assert!(!storage.contains(TOKEN_KEY));
}

#[rstest]
#[tokio::test]
async fn signing_in_again_ends_the_previous_session() {
    let mut accounts = MockAccountCommand::new();
    let mut issued = 0;
    accounts.expect_login().times(2).returning(move |_| {
        issued += 1;
        Ok(AuthenticatedAccount {
            user: resident(),
            token: SessionToken::new(format!("token-{issued}")),
        })
    });
    accounts
        .expect_logout()
        .withf(|token| token.expose() == "token-1")
        .times(1)
        .returning(|_| Ok(()));
    let storage = Arc::new(MemoryStorage::new());
    let ctx = context(accounts, Arc::clone(&storage));

    ctx.login("juan@example.ph", "secret1")
        .await
        .expect("first login");
    ctx.login("juan@example.ph", "secret1")
        .await
        .expect("second login");

    assert_eq!(
        storage.get(TOKEN_KEY).await.expect("token read"),
        Some(json!("token-2"))
    );
}

#[rstest]
#[tokio::test]
async fn failed_token_write_ends_the_new_session() {
    let mut accounts = MockAccountCommand::new();
    let account = signed_in(resident());
    accounts.expect_login().return_once(move |_| Ok(account));
    accounts
        .expect_logout()
        .withf(|token| token.expose() == "token-1")
        .times(1)
        .returning(|_| Ok(()));
    let mut storage = MockDurableStorage::new();
    storage
        .expect_set()
        .times(1)
        .returning(|key, _| Err(DurableStorageError::io(format!("disk full writing {key}"))));
    storage.expect_remove().times(2).returning(|_| Ok(()));
    let ctx = SessionContext::new(Arc::new(accounts), Arc::new(storage));

    let err = ctx
        .login("juan@example.ph", "secret1")
        .await
        .expect_err("caching fails");

    assert!(matches!(err, SessionError::Storage { .. }));
    assert_eq!(ctx.state(), SessionState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn restore_resumes_cached_token() {
    let user = resident();
    let mut accounts = MockAccountCommand::new();
    let resumed = user.clone();
    accounts
        .expect_resume()
        .withf(|token| token.expose() == "cached-token")
        .times(1)
        .return_once(move |_| Ok(Some(resumed)));
    let storage = Arc::new(MemoryStorage::new());
    storage.insert_raw(TOKEN_KEY, "\"cached-token\"");
    let ctx = context(accounts, storage);

    ctx.restore().await;
    ctx.restore().await;

    assert_eq!(ctx.state(), SessionState::Authenticated(user));
}

#[rstest]
#[tokio::test]
async fn corrupt_cache_restores_as_anonymous() {
    let storage = Arc::new(MemoryStorage::new());
    storage.insert_raw(TOKEN_KEY, "{broken");
    storage.insert_raw(USER_KEY, "not json either");
    let ctx = context(MockAccountCommand::new(), Arc::clone(&storage));

    ctx.restore().await;

    assert_eq!(ctx.state(), SessionState::Anonymous);
    assert!(!storage.contains(USER_KEY));
}

#[rstest]
#[tokio::test]
async fn restore_failure_degrades_to_anonymous() {
    let mut accounts = MockAccountCommand::new();
    accounts
        .expect_resume()
        .return_once(|_| Err(SessionError::unavailable("timeout")));
    let storage = Arc::new(MemoryStorage::new());
    storage.insert_raw(TOKEN_KEY, "\"cached-token\"");
    let ctx = context(accounts, Arc::clone(&storage));

    ctx.restore().await;

    assert_eq!(ctx.state(), SessionState::Anonymous);
    assert!(!storage.contains(TOKEN_KEY));
}

#[rstest]
#[tokio::test]
async fn update_user_without_session_is_a_no_op() {
    let ctx = context(MockAccountCommand::new(), Arc::new(MemoryStorage::new()));
    ctx.restore().await;
    let outcome = ctx
        .update_user(ProfileUpdateDraft {
            first_name: Some("Pedro".to_owned()),
            ..ProfileUpdateDraft::default()
        })
        .await
        .expect("no-op");
    assert!(outcome.is_none());
}

#[rstest]
#[tokio::test]
async fn update_user_republishes_merged_profile() {
    let user = resident();
    let mut accounts = MockAccountCommand::new();
    let account = signed_in(user.clone());
    accounts.expect_login().return_once(move |_| Ok(account));
    let merged = user.clone().apply(
        ProfileUpdate::try_from(ProfileUpdateDraft {
            first_name: Some("Pedro".to_owned()),
            ..ProfileUpdateDraft::default()
        })
        .expect("valid update"),
        user.updated_at(),
    );
    let returned = merged.clone();
    accounts
        .expect_update_profile()
        .times(1)
        .return_once(move |_, _| Ok(returned));
    let ctx = context(accounts, Arc::new(MemoryStorage::new()));
    ctx.login("juan@example.ph", "secret1")
        .await
        .expect("login succeeds");

    let updated = ctx
        .update_user(ProfileUpdateDraft {
            first_name: Some("Pedro".to_owned()),
            ..ProfileUpdateDraft::default()
        })
        .await
        .expect("update succeeds");

    assert_eq!(updated, Some(merged.clone()));
    assert_eq!(ctx.current_user(), Some(merged));
}
