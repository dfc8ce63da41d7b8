//! Embedded schema migrations.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Migration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// Could not connect to the database.
    #[error("failed to connect for migrations: {message}")]
    Connect {
        /// Underlying cause.
        message: String,
    },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply {
        /// Underlying cause.
        message: String,
    },
}

/// Apply pending migrations on a blocking thread.
///
/// # Errors
///
/// Returns [`MigrationError`] when the connection or a migration fails.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url).map_err(|err| MigrationError::Connect {
            message: err.to_string(),
        })?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| MigrationError::Apply {
                message: err.to_string(),
            })?;
        info!(count = applied.len(), "database migrations applied");
        Ok(())
    })
    .await
    .map_err(|err| MigrationError::Apply {
        message: err.to_string(),
    })?
}
