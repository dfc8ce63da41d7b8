//! bb8 pool of `diesel-async` PostgreSQL connections.
//!
//! Checkout is async and bounded by the configured timeout; failures surface
//! as [`PoolError`] so repositories can map them to their own connection
//! errors.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Pool construction and checkout failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became available.
    #[error("failed to get connection from pool: {message}")]
    Checkout {
        /// Underlying cause.
        message: String,
    },

    /// The pool could not be created.
    #[error("failed to build connection pool: {message}")]
    Build {
        /// Underlying cause.
        message: String,
    },
}

impl PoolError {
    /// Checkout failure.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Construction failure.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Pool sizing and timeouts.
///
/// Defaults: 10 connections, 2 kept idle, 30 second checkout timeout.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Configuration for `database_url` with default sizing.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            min_idle: Some(2),
            connection_timeout: Duration::from_secs(30),
        }
    }

    /// Upper bound on open connections.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Connections kept open while idle.
    #[must_use]
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// How long a checkout may wait.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Target database.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Shared connection pool; cheap to clone.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool and open its initial idle connections.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] for an invalid URL or an unreachable
    /// server.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when the timeout elapses first.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
