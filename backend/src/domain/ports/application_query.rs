//! Driving port for application reads.

use async_trait::async_trait;
use pagination::PageParams;

use crate::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationPage, DashboardStats, DocumentType,
    LifecycleError, User,
};

/// Read-side operations; every call is scoped to the acting user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationQuery: Send + Sync {
    /// One page of visible applications, newest first.
    async fn list(
        &self,
        acting_user: &User,
        filter: &ApplicationFilter,
        page: &PageParams,
    ) -> Result<ApplicationPage, LifecycleError>;

    /// One visible application.
    async fn get(
        &self,
        acting_user: &User,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError>;

    /// Look up a visible application by tracking number.
    async fn find_by_tracking_number(
        &self,
        acting_user: &User,
        tracking_number: &str,
    ) -> Result<Application, LifecycleError>;

    /// Totals and recent activity for the caller's dashboard.
    async fn dashboard_stats(&self, acting_user: &User) -> Result<DashboardStats, LifecycleError>;

    /// Document types open for requests.
    async fn document_types(&self) -> Result<Vec<DocumentType>, LifecycleError>;
}
