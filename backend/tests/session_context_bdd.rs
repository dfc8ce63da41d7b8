//! Behaviour tests for the client session context and the route guard.
//!
//! Each scenario drives a `SessionContext` over the in-memory identity
//! store and durable storage, restarting the client by building a new
//! context over the same storage.

use std::cell::RefCell;
use std::sync::Arc;

use portal::domain::{
    AccessDecision, AccountService, Role, SessionContext, TOKEN_KEY, USER_KEY, User, evaluate,
};
use portal::domain::ports::UserProfileRepository;
use portal::outbound::identity::InMemoryIdentityStore;
use portal::outbound::memory::InMemoryUserProfileRepository;
use portal::outbound::storage::MemoryStorage;
use portal::test_support::clock::fixture_clock;
use portal::test_support::users::resident;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;

const PASSWORD: &str = "secret1";

type Accounts = AccountService<InMemoryIdentityStore, InMemoryUserProfileRepository>;
type Context = SessionContext<Accounts, MemoryStorage>;

struct SessionWorld {
    runtime: Runtime,
    juan: User,
    accounts: RefCell<Option<Arc<Accounts>>>,
    storage: Arc<MemoryStorage>,
    context: RefCell<Option<Context>>,
}

impl SessionWorld {
    fn new() -> Self {
        Self {
            runtime: tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime"),
            juan: resident(),
            accounts: RefCell::new(None),
            storage: Arc::new(MemoryStorage::new()),
            context: RefCell::new(None),
        }
    }

    fn accounts(&self) -> Arc<Accounts> {
        self.accounts.borrow().clone().expect("accounts configured")
    }

    fn start_client(&self) {
        let context = SessionContext::new(self.accounts(), Arc::clone(&self.storage));
        *self.context.borrow_mut() = Some(context);
    }

    fn with_context<T>(&self, f: impl FnOnce(&Context) -> T) -> T {
        let context = self.context.borrow();
        f(context.as_ref().expect("client started"))
    }

    fn sign_in(&self) {
        let email = self.juan.email().as_ref().to_owned();
        self.with_context(|context| {
            self.runtime
                .block_on(context.login(&email, PASSWORD))
                .expect("login succeeds");
        });
    }

    fn decision(&self, required_role: Option<Role>) -> AccessDecision {
        self.with_context(|context| evaluate(&context.state(), required_role))
    }
}

#[fixture]
fn world() -> SessionWorld {
    SessionWorld::new()
}

#[given("Juan has a portal account")]
fn juan_has_a_portal_account(world: &SessionWorld) {
    let identity = InMemoryIdentityStore::new().with_account(
        *world.juan.id(),
        world.juan.email().clone(),
        PASSWORD,
    );
    let profiles = Arc::new(InMemoryUserProfileRepository::new());
    world
        .runtime
        .block_on(profiles.insert(&world.juan))
        .expect("profile stored");
    let accounts = AccountService::new(Arc::new(identity), profiles, fixture_clock());
    *world.accounts.borrow_mut() = Some(Arc::new(accounts));
}

#[given("a freshly started client")]
fn a_freshly_started_client(world: &SessionWorld) {
    world.start_client();
}

#[given("Juan signed in on a previous run")]
fn juan_signed_in_previously(world: &SessionWorld) {
    world.start_client();
    world.sign_in();
    assert!(world.storage.contains(TOKEN_KEY));
}

#[given("the cached session token is corrupt")]
fn the_cached_token_is_corrupt(world: &SessionWorld) {
    world.storage.insert_raw(TOKEN_KEY, "{not json");
    world.storage.insert_raw(USER_KEY, "{\"id\":");
}

#[when("Juan signs in with the correct password")]
fn juan_signs_in(world: &SessionWorld) {
    world.sign_in();
}

#[when("the client restarts and restores the session")]
fn the_client_restarts(world: &SessionWorld) {
    world.start_client();
    world.with_context(|context| world.runtime.block_on(context.restore()));
}

#[when("Juan signs out")]
fn juan_signs_out(world: &SessionWorld) {
    world.with_context(|context| world.runtime.block_on(context.logout()));
}

#[then("the current user is Juan")]
fn the_current_user_is_juan(world: &SessionWorld) {
    let user = world
        .with_context(Context::current_user)
        .expect("signed in");
    assert_eq!(user.email(), world.juan.email());
}

#[then("the session is no longer loading")]
fn the_session_is_no_longer_loading(world: &SessionWorld) {
    assert!(!world.with_context(Context::is_loading));
}

#[then("nobody is signed in")]
fn nobody_is_signed_in(world: &SessionWorld) {
    assert!(world.with_context(Context::current_user).is_none());
    assert!(!world.with_context(Context::is_loading));
}

#[then("nothing is cached")]
fn nothing_is_cached(world: &SessionWorld) {
    assert!(!world.storage.contains(TOKEN_KEY));
    assert!(!world.storage.contains(USER_KEY));
}

#[then("the guard allows the resident dashboard")]
fn the_guard_allows_the_dashboard(world: &SessionWorld) {
    assert_eq!(world.decision(None), AccessDecision::Allow);
}

#[then("the guard sends Juan away from the admin pages")]
fn the_guard_redirects_from_admin(world: &SessionWorld) {
    assert_eq!(
        world.decision(Some(Role::Admin)),
        AccessDecision::RedirectToDashboard
    );
}

#[then("the guard reports the session as pending")]
fn the_guard_reports_pending(world: &SessionWorld) {
    assert!(world.with_context(Context::is_loading));
    assert_eq!(world.decision(Some(Role::Admin)), AccessDecision::Pending);
}

#[then("the guard sends the visitor to the login page")]
fn the_guard_sends_to_login(world: &SessionWorld) {
    assert_eq!(world.decision(None), AccessDecision::RedirectToLogin);
}

#[scenario(
    path = "tests/features/session_context.feature",
    name = "Signing in resolves the session"
)]
fn signing_in_resolves_the_session(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_context.feature",
    name = "The guard waits while the session resolves"
)]
fn the_guard_waits_while_the_session_resolves(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_context.feature",
    name = "A restarted client resumes the session"
)]
fn a_restarted_client_resumes_the_session(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_context.feature",
    name = "Corrupt cached data reads as signed out"
)]
fn corrupt_cached_data_reads_as_signed_out(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_context.feature",
    name = "Signing out clears the cache"
)]
fn signing_out_clears_the_cache(world: SessionWorld) {
    drop(world);
}
