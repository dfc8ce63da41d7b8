//! Driving port for application mutations.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{
    Application, ApplicationId, AttachmentDraft, DocumentTypeId, LifecycleError, ProcessAction,
    User,
};

/// Raw submission input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    /// Requested document.
    pub document_type_id: DocumentTypeId,
    /// Why the document is needed.
    pub purpose: String,
    /// Supporting file metadata.
    pub attachments: Vec<AttachmentDraft>,
}

/// Reviewer decision input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessApplicationRequest {
    /// Application under review.
    pub application_id: ApplicationId,
    /// Approve or reject.
    pub action: ProcessAction,
    /// Required when rejecting.
    pub rejection_reason: Option<String>,
    /// Optional reviewer notes.
    pub notes: Option<String>,
}

/// Lifecycle transitions available to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationCommand: Send + Sync {
    /// Submit a new application owned by `acting_user`.
    async fn submit(
        &self,
        acting_user: &User,
        request: SubmitApplicationRequest,
    ) -> Result<Application, LifecycleError>;

    /// Approve or reject a pending application.
    async fn process(
        &self,
        acting_user: &User,
        request: ProcessApplicationRequest,
    ) -> Result<Application, LifecycleError>;

    /// Withdraw the caller's own pending application.
    async fn cancel(
        &self,
        acting_user: &User,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError>;

    /// Mark an approved application as released.
    async fn complete(
        &self,
        acting_user: &User,
        application_id: &ApplicationId,
    ) -> Result<Application, LifecycleError>;
}
