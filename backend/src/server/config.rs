//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use portal::inbound::http::session_config::SessionSettings;
use portal::inbound::ws::OriginAllowList;
use portal::outbound::persistence::DbPool;
use portal::settings::IdentityEndpoint;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) identity: Option<IdentityEndpoint>,
    pub(crate) allowed_origins: OriginAllowList,
    pub(crate) seed_document_types: bool,
}

impl ServerConfig {
    /// Configuration with in-memory adapters and no allowed origins.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            identity: None,
            allowed_origins: OriginAllowList::default(),
            seed_document_types: true,
        }
    }

    /// Attach a database connection pool for the Diesel adapters.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Delegate credentials to a remote identity service.
    #[must_use]
    pub fn with_identity(mut self, identity: Option<IdentityEndpoint>) -> Self {
        self.identity = identity;
        self
    }

    /// Origins allowed to open the live application socket.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: OriginAllowList) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Whether to upsert the default catalogue before serving.
    #[must_use]
    pub fn with_seed_document_types(mut self, seed: bool) -> Self {
        self.seed_document_types = seed;
        self
    }

    /// Return the socket address the server will bind to.
    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "Exercised by bootstrap tests")
    )]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
