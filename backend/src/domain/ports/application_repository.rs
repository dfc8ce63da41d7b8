//! Port for application rows and their attachments.

use async_trait::async_trait;

use crate::domain::{
    Application, ApplicationCursorKey, ApplicationFilter, ApplicationId, ApplicationScope,
    ApplicationStatus, StatusCounts, TrackingNumber,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by application repository adapters.
    pub enum ApplicationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "application repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "application repository query failed: {message}",
        /// The tracking number is already taken.
        DuplicateTrackingNumber { tracking_number: String } =>
            "tracking number already in use: {tracking_number}",
        /// A stored row failed domain validation.
        Corrupt { message: String } => "stored application is invalid: {message}",
    }
}

/// One keyset page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationListQuery {
    /// Rows the caller may see.
    pub scope: ApplicationScope,
    /// Optional filters.
    pub filter: ApplicationFilter,
    /// Resume strictly after this position.
    pub after: Option<ApplicationCursorKey>,
    /// Maximum rows to return.
    pub limit: usize,
}

/// Port for writing applications and reading them back in listing order.
///
/// Scope is applied by the adapter inside the query so rows outside it are
/// never loaded.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Insert a new application with its attachments.
    async fn insert(&self, application: &Application) -> Result<(), ApplicationPersistenceError>;

    /// Persist a transition if the stored status still equals `expected`.
    ///
    /// Returns `false` when the row was missing or had moved on.
    async fn update_status(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> Result<bool, ApplicationPersistenceError>;

    /// Fetch one application.
    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, ApplicationPersistenceError>;

    /// Fetch by public tracking number.
    async fn find_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<Application>, ApplicationPersistenceError>;

    /// Whether a tracking number is taken.
    async fn tracking_number_exists(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<bool, ApplicationPersistenceError>;

    /// Rows ordered by `submitted_at DESC, id DESC`.
    async fn list(
        &self,
        query: &ApplicationListQuery,
    ) -> Result<Vec<Application>, ApplicationPersistenceError>;

    /// Status totals within a scope.
    async fn status_counts(
        &self,
        scope: &ApplicationScope,
    ) -> Result<StatusCounts, ApplicationPersistenceError>;
}
