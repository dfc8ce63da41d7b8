//! Builders wiring adapters into the HTTP and WebSocket state.
//!
//! PostgreSQL-backed repositories are used when a pool is configured,
//! otherwise the in-memory adapters. Credentials go to the remote identity
//! service when one is configured, otherwise to the in-memory store.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use portal::domain::ports::{
    AccountCommand, ApplicationChangeFeed, ApplicationCommand, ApplicationQuery,
    ApplicationRepository, DocumentTypeRepository, IdentityStore, UserProfileRepository,
};
use portal::domain::{
    AccountService, ApplicationLifecyclePorts, ApplicationLifecycleService,
    default_document_types,
};
use portal::inbound::http::state::HttpState;
use portal::inbound::ws::WsState;
use portal::outbound::identity::{HttpIdentityConfig, HttpIdentityStore, InMemoryIdentityStore};
use portal::outbound::memory::{
    InMemoryApplicationRepository, InMemoryDocumentTypeRepository, InMemoryUserProfileRepository,
};
use portal::outbound::notify::BroadcastChangeFeed;
use portal::outbound::persistence::{
    DieselApplicationRepository, DieselDocumentTypeRepository, DieselUserProfileRepository,
};

use super::ServerConfig;

/// Handler state for both inbound adapters.
pub(super) struct PortalState {
    pub(super) http: HttpState,
    pub(super) ws: WsState,
}

/// Command and query faces of the lifecycle engine.
type LifecyclePair = (Arc<dyn ApplicationCommand>, Arc<dyn ApplicationQuery>);

fn build_accounts<P>(
    config: &ServerConfig,
    profiles: Arc<P>,
    clock: Arc<dyn Clock>,
) -> std::io::Result<Arc<dyn AccountCommand>>
where
    P: UserProfileRepository + 'static,
{
    match &config.identity {
        Some(endpoint) => {
            let store = HttpIdentityStore::new(HttpIdentityConfig::new(
                endpoint.base_url.clone(),
                endpoint.api_key.clone(),
            ))
            .map_err(|err| std::io::Error::other(format!("identity client: {err}")))?;
            info!(base_url = %endpoint.base_url, "using remote identity service");
            Ok(account_service(Arc::new(store), profiles, clock))
        }
        None => {
            if config.db_pool.is_some() {
                warn!("no identity service configured; credentials are kept in memory only");
            }
            Ok(account_service(
                Arc::new(InMemoryIdentityStore::new()),
                profiles,
                clock,
            ))
        }
    }
}

fn account_service<I, P>(
    identity: Arc<I>,
    profiles: Arc<P>,
    clock: Arc<dyn Clock>,
) -> Arc<dyn AccountCommand>
where
    I: IdentityStore + 'static,
    P: UserProfileRepository + 'static,
{
    Arc::new(AccountService::new(identity, profiles, clock))
}

async fn build_lifecycle<R, D, U>(
    config: &ServerConfig,
    ports: ApplicationLifecyclePorts<R, D, U>,
    clock: Arc<dyn Clock>,
) -> std::io::Result<LifecyclePair>
where
    R: ApplicationRepository + 'static,
    D: DocumentTypeRepository + 'static,
    U: UserProfileRepository + 'static,
{
    if config.seed_document_types {
        let catalogue = default_document_types();
        ports
            .document_types
            .upsert(&catalogue)
            .await
            .map_err(|err| std::io::Error::other(format!("seeding document types: {err}")))?;
        info!(count = catalogue.len(), "document catalogue seeded");
    }
    let service = Arc::new(ApplicationLifecycleService::new(ports, clock));
    Ok((service.clone(), service))
}

/// Wire adapters for the configured backends.
///
/// # Errors
///
/// Fails when the identity client cannot be built or catalogue seeding fails.
pub(super) async fn build_portal_state(config: &ServerConfig) -> std::io::Result<PortalState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let feed = Arc::new(BroadcastChangeFeed::default());
    let changes: Arc<dyn ApplicationChangeFeed> = feed;

    let (accounts, (applications, applications_query)) = match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL repositories");
            let profiles = Arc::new(DieselUserProfileRepository::new(pool.clone()));
            let accounts = build_accounts(config, Arc::clone(&profiles), clock.clone())?;
            let ports = ApplicationLifecyclePorts {
                applications: Arc::new(DieselApplicationRepository::new(pool.clone())),
                document_types: Arc::new(DieselDocumentTypeRepository::new(pool.clone())),
                users: profiles,
                changes: changes.clone(),
            };
            (accounts, build_lifecycle(config, ports, clock.clone()).await?)
        }
        None => {
            warn!("no database configured; records are kept in memory only");
            let profiles = Arc::new(InMemoryUserProfileRepository::new());
            let accounts = build_accounts(config, Arc::clone(&profiles), clock.clone())?;
            let ports = ApplicationLifecyclePorts {
                applications: Arc::new(InMemoryApplicationRepository::new()),
                document_types: Arc::new(InMemoryDocumentTypeRepository::new()),
                users: profiles,
                changes: changes.clone(),
            };
            (accounts, build_lifecycle(config, ports, clock.clone()).await?)
        }
    };

    Ok(PortalState {
        http: HttpState::new(accounts.clone(), applications, applications_query),
        ws: WsState::new(accounts, changes, config.allowed_origins.clone()),
    })
}
