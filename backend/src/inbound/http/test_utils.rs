//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};

use crate::domain::ports::UserProfileRepository;
use crate::domain::{AccountService, ApplicationLifecyclePorts, ApplicationLifecycleService, User};
use crate::outbound::identity::InMemoryIdentityStore;
use crate::outbound::memory::{
    InMemoryApplicationRepository, InMemoryDocumentTypeRepository, InMemoryUserProfileRepository,
};
use crate::outbound::notify::BroadcastChangeFeed;
use crate::test_support::clock::fixture_clock;

use super::state::HttpState;

/// Password given to every seeded account.
pub const TEST_PASSWORD: &str = "secret1";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Portal wired to in-memory adapters.
pub struct TestPortal {
    /// Handler state.
    pub state: HttpState,
    /// Profile store, for inspecting or deactivating users.
    pub profiles: Arc<InMemoryUserProfileRepository>,
    /// Change feed the lifecycle service publishes to.
    pub changes: Arc<BroadcastChangeFeed>,
}

/// Seed `users` with [`TEST_PASSWORD`] and wire the services.
pub async fn test_portal(users: &[User]) -> TestPortal {
    let identity = users.iter().fold(InMemoryIdentityStore::new(), |store, user| {
        store.with_account(*user.id(), user.email().clone(), TEST_PASSWORD)
    });
    let profiles = Arc::new(InMemoryUserProfileRepository::new());
    for user in users {
        profiles.insert(user).await.expect("seed profile");
    }
    let changes = Arc::new(BroadcastChangeFeed::default());
    let clock = fixture_clock();
    let accounts = Arc::new(AccountService::new(
        Arc::new(identity),
        Arc::clone(&profiles),
        clock.clone(),
    ));
    let lifecycle = Arc::new(ApplicationLifecycleService::new(
        ApplicationLifecyclePorts {
            applications: Arc::new(InMemoryApplicationRepository::new()),
            document_types: Arc::new(InMemoryDocumentTypeRepository::seeded()),
            users: Arc::clone(&profiles),
            changes: changes.clone(),
        },
        clock,
    ));
    TestPortal {
        state: HttpState::new(accounts, lifecycle.clone(), lifecycle),
        profiles,
        changes,
    }
}

/// App serving the REST API under `/api/v1` with a test session store.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(web::scope("/api/v1").configure(super::configure_api))
}

/// `POST /api/v1/login` for a seeded account.
pub fn login_request(email: &str) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(serde_json::json!({ "email": email, "password": TEST_PASSWORD }))
}

/// Session cookie set on `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("session cookie")
}
