//! Portal runtime configuration loaded via OrthoConfig.
//!
//! Values layer CLI flags over `PORTAL_*` environment variables over an
//! optional configuration file. Session cookie settings are read separately
//! by [`crate::inbound::http::session_config`].

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Settings that cannot be turned into runtime values.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        /// Configured value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },
    /// `identity_url` is not an absolute URL.
    #[error("invalid identity URL {value:?}: {source}")]
    IdentityUrl {
        /// Configured value.
        value: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// An identity URL was given without an API key.
    #[error("identity_url is set but identity_api_key is missing")]
    MissingIdentityKey,
}

/// Connection details for the remote identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoint {
    /// Service base URL.
    pub base_url: Url,
    /// Key sent with every request.
    pub api_key: String,
}

/// Configuration values for the portal server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory adapters are used when absent.
    pub database_url: Option<String>,
    /// Apply pending migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
    /// Base URL of the hosted identity service.
    pub identity_url: Option<String>,
    /// API key for the identity service.
    pub identity_api_key: Option<String>,
    /// Comma-separated WebSocket origin allow-list.
    pub allowed_origins: Option<String>,
    /// Seed the default document catalogue on startup.
    #[ortho_config(default = true)]
    pub seed_document_types: bool,
}

impl PortalSettings {
    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Remote identity service, when configured.
    pub fn identity_endpoint(&self) -> Result<Option<IdentityEndpoint>, SettingsError> {
        let Some(raw) = self
            .identity_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        else {
            return Ok(None);
        };
        let base_url = Url::parse(raw).map_err(|source| SettingsError::IdentityUrl {
            value: raw.to_owned(),
            source,
        })?;
        let api_key = self
            .identity_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SettingsError::MissingIdentityKey)?;
        Ok(Some(IdentityEndpoint { base_url, api_key }))
    }

    /// Allow-list entries, or `None` when unset so callers can pick a default.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        self.allowed_origins.as_deref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_owned)
                .collect()
        })
    }
}
