//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, and the services that drive them through ports.
//! Keep types immutable and document invariants and serialisation contracts
//! (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - User, Role: resident and staff profiles.
//! - Application, ApplicationStatus: document requests and their lifecycle.
//! - SessionContext: client-side authentication state.
//! - evaluate: route authorization guard.
//! - AccountService, ApplicationLifecycleService: port implementations
//!   consumed by inbound adapters.

pub mod account_service;
pub mod application;
pub mod application_service;
pub mod auth;
pub mod document_type;
pub mod error;
pub mod guard;
pub mod ports;
pub mod service_error;
pub mod session_context;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::application::{
    ALLOWED_FILE_TYPES, Application, ApplicationChange, ApplicationCursorKey, ApplicationFilter,
    ApplicationId, ApplicationPage, ApplicationRecord, ApplicationScope, ApplicationStatus,
    ApplicationValidationError, Attachment, AttachmentDraft, AttachmentId, ChangeKind,
    DashboardStats, FileType, LiveApplicationList, MAX_ATTACHMENT_BYTES, MAX_ATTACHMENTS,
    NOTES_MAX, NewApplication, PURPOSE_MAX, PURPOSE_MIN, ProcessAction, Purpose,
    RECENT_APPLICATIONS, REASON_MAX, RejectionReason, ReviewDecision, StatusCounts,
    TrackingNumber, TrackingNumberError, TransitionError, UnknownStatus, parse_notes,
};
pub use self::application_service::{
    ApplicationLifecyclePorts, ApplicationLifecycleService, MAX_TRACKING_ATTEMPTS,
};
pub use self::auth::{
    AccountValidationError, LoginCredentials, PASSWORD_MIN, ProfileUpdate, ProfileUpdateDraft,
    Registration, RegistrationDraft, SessionToken,
};
pub use self::document_type::{
    DocumentType, DocumentTypeDraft, DocumentTypeId, DocumentTypeValidationError, Fee,
    default_document_types,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::guard::{AccessDecision, SessionState, evaluate};
pub use self::service_error::{LifecycleError, SessionError};
pub use self::session_context::{SessionContext, TOKEN_KEY, USER_KEY};
pub use self::trace_id::TraceId;
pub use self::user::{
    Address, ContactNumber, Email, PersonName, Role, User, UserDraft, UserId,
    UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use portal::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
