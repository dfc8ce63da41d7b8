//! Document request lifecycle.
//!
//! An [`Application`] moves through the status graph
//! `pending → {approved, rejected, cancelled}` and `approved → completed`.
//! `under_review` is a recognised intermediate state that may also move to
//! `approved` or `rejected`. Every transition is a method that consumes the
//! record and returns the successor, so a failed transition leaves the caller
//! holding nothing it could persist by accident.

mod attachment;
mod change;
mod live_view;
mod query;
mod status;
mod tracking;

pub use attachment::{
    ALLOWED_FILE_TYPES, Attachment, AttachmentDraft, AttachmentId, FileType, MAX_ATTACHMENT_BYTES,
    MAX_ATTACHMENTS,
};
pub use change::{ApplicationChange, ChangeKind};
pub use live_view::LiveApplicationList;
pub use query::{
    ApplicationCursorKey, ApplicationFilter, ApplicationPage, ApplicationScope, DashboardStats,
    RECENT_APPLICATIONS, StatusCounts,
};
pub use status::{ApplicationStatus, ProcessAction, TransitionError, UnknownStatus};
pub use tracking::{TrackingNumber, TrackingNumberError};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DocumentTypeId, UserId};

/// Minimum purpose length.
pub const PURPOSE_MIN: usize = 10;
/// Maximum purpose length.
pub const PURPOSE_MAX: usize = 1000;
/// Maximum rejection reason length.
pub const REASON_MAX: usize = 500;
/// Maximum reviewer notes length.
pub const NOTES_MAX: usize = 1000;

/// Validation errors for application input and stored records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationValidationError {
    /// Identifier was not a UUID.
    InvalidId,
    /// Purpose shorter than [`PURPOSE_MIN`].
    PurposeTooShort {
        /// Minimum length.
        min: usize,
    },
    /// Purpose longer than [`PURPOSE_MAX`].
    PurposeTooLong {
        /// Maximum length.
        max: usize,
    },
    /// No attachments were supplied.
    NoAttachments,
    /// More than [`MAX_ATTACHMENTS`] attachments.
    TooManyAttachments {
        /// Maximum count.
        max: usize,
    },
    /// An attachment has a blank file name.
    BlankFileName {
        /// Position in the submitted list.
        index: usize,
    },
    /// An attachment is empty.
    EmptyAttachment {
        /// Position in the submitted list.
        index: usize,
    },
    /// An attachment exceeds [`MAX_ATTACHMENT_BYTES`].
    AttachmentTooLarge {
        /// Position in the submitted list.
        index: usize,
        /// Maximum size in bytes.
        max: u64,
    },
    /// An attachment MIME type is not allowed.
    UnsupportedFileType {
        /// Position in the submitted list.
        index: usize,
        /// Rejected MIME type.
        file_type: String,
    },
    /// The document type does not exist.
    UnknownDocumentType,
    /// The document type no longer accepts requests.
    InactiveDocumentType,
    /// Reviewer notes longer than [`NOTES_MAX`].
    NotesTooLong {
        /// Maximum length.
        max: usize,
    },
    /// Rejection reason longer than [`REASON_MAX`].
    ReasonTooLong {
        /// Maximum length.
        max: usize,
    },
    /// The pagination cursor could not be decoded.
    InvalidCursor,
    /// The tracking number is malformed.
    InvalidTrackingNumber,
    /// A stored record breaks a lifecycle invariant.
    InconsistentRecord(&'static str),
}

impl ApplicationValidationError {
    /// Wire name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId | Self::InconsistentRecord(_) => "id",
            Self::PurposeTooShort { .. } | Self::PurposeTooLong { .. } => "purpose",
            Self::NoAttachments
            | Self::TooManyAttachments { .. }
            | Self::BlankFileName { .. }
            | Self::EmptyAttachment { .. }
            | Self::AttachmentTooLarge { .. }
            | Self::UnsupportedFileType { .. } => "attachments",
            Self::UnknownDocumentType | Self::InactiveDocumentType => "documentTypeId",
            Self::NotesTooLong { .. } => "notes",
            Self::ReasonTooLong { .. } => "rejectionReason",
            Self::InvalidCursor => "cursor",
            Self::InvalidTrackingNumber => "trackingNumber",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::PurposeTooShort { .. } => "purpose_too_short",
            Self::PurposeTooLong { .. } => "purpose_too_long",
            Self::NoAttachments => "no_attachments",
            Self::TooManyAttachments { .. } => "too_many_attachments",
            Self::BlankFileName { .. } => "blank_file_name",
            Self::EmptyAttachment { .. } => "empty_attachment",
            Self::AttachmentTooLarge { .. } => "attachment_too_large",
            Self::UnsupportedFileType { .. } => "unsupported_file_type",
            Self::UnknownDocumentType => "unknown_document_type",
            Self::InactiveDocumentType => "inactive_document_type",
            Self::NotesTooLong { .. } => "notes_too_long",
            Self::ReasonTooLong { .. } => "reason_too_long",
            Self::InvalidCursor => "invalid_cursor",
            Self::InvalidTrackingNumber => "invalid_tracking_number",
            Self::InconsistentRecord(_) => "inconsistent_record",
        }
    }

    /// Attachment position, when the failure concerns one attachment.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::BlankFileName { index }
            | Self::EmptyAttachment { index }
            | Self::AttachmentTooLarge { index, .. }
            | Self::UnsupportedFileType { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "application id must be a valid UUID"),
            Self::PurposeTooShort { min } => {
                write!(f, "purpose must be at least {min} characters")
            }
            Self::PurposeTooLong { max } => write!(f, "purpose must be at most {max} characters"),
            Self::NoAttachments => write!(f, "at least one attachment is required"),
            Self::TooManyAttachments { max } => write!(f, "maximum {max} files allowed"),
            Self::BlankFileName { index } => {
                write!(f, "attachment {index} must have a file name")
            }
            Self::EmptyAttachment { index } => write!(f, "attachment {index} is empty"),
            Self::AttachmentTooLarge { index, max } => {
                write!(f, "attachment {index} exceeds the {max} byte limit")
            }
            Self::UnsupportedFileType { index, file_type } => {
                write!(f, "attachment {index} has unsupported type {file_type}")
            }
            Self::UnknownDocumentType => write!(f, "document type does not exist"),
            Self::InactiveDocumentType => {
                write!(f, "document type is not accepting applications")
            }
            Self::NotesTooLong { max } => write!(f, "notes must be at most {max} characters"),
            Self::ReasonTooLong { max } => {
                write!(f, "rejection reason must be at most {max} characters")
            }
            Self::InvalidCursor => write!(f, "pagination cursor is invalid"),
            Self::InvalidTrackingNumber => write!(f, "tracking number is malformed"),
            Self::InconsistentRecord(detail) => write!(f, "inconsistent application: {detail}"),
        }
    }
}

impl std::error::Error for ApplicationValidationError {}

/// Application identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationId(Uuid);

impl ApplicationId {
    /// Parse an identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ApplicationValidationError> {
        Uuid::parse_str(raw.as_ref())
            .map(Self)
            .map_err(|_| ApplicationValidationError::InvalidId)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ApplicationId> for String {
    fn from(value: ApplicationId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ApplicationId {
    type Error = ApplicationValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Why the resident needs the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purpose(String);

impl Purpose {
    /// Validate a purpose statement.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ApplicationValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length < PURPOSE_MIN {
            return Err(ApplicationValidationError::PurposeTooShort { min: PURPOSE_MIN });
        }
        if length > PURPOSE_MAX {
            return Err(ApplicationValidationError::PurposeTooLong { max: PURPOSE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Purpose {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Non-blank rejection reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionReason(String);

impl RejectionReason {
    /// Accept a reason; blank input yields `Ok(None)` so callers decide
    /// whether absence is an error.
    pub fn parse(raw: Option<&str>) -> Result<Option<Self>, ApplicationValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) if value.chars().count() > REASON_MAX => {
                Err(ApplicationValidationError::ReasonTooLong { max: REASON_MAX })
            }
            Some(value) => Ok(Some(Self(value.to_owned()))),
        }
    }
}

impl AsRef<str> for RejectionReason {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Optional reviewer notes, trimmed; blank becomes `None`.
pub fn parse_notes(raw: Option<&str>) -> Result<Option<String>, ApplicationValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.chars().count() > NOTES_MAX => {
            Err(ApplicationValidationError::NotesTooLong { max: NOTES_MAX })
        }
        Some(value) => Ok(Some(value.to_owned())),
    }
}

/// Reviewer decision for a pending application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Approve the request.
    Approve {
        /// Optional reviewer notes.
        notes: Option<String>,
    },
    /// Reject the request with a reason.
    Reject {
        /// Reason shown to the resident.
        reason: RejectionReason,
        /// Optional reviewer notes.
        notes: Option<String>,
    },
}

impl ReviewDecision {
    /// Target status of the decision.
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            Self::Approve { .. } => ApplicationStatus::Approved,
            Self::Reject { .. } => ApplicationStatus::Rejected,
        }
    }
}

/// Raw application values, used when rehydrating stored rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    /// Identifier.
    pub id: ApplicationId,
    /// Owning resident.
    pub user_id: UserId,
    /// Requested document.
    pub document_type_id: DocumentTypeId,
    /// Purpose statement.
    pub purpose: String,
    /// Current status.
    pub status: ApplicationStatus,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Review time.
    pub processed_at: Option<DateTime<Utc>>,
    /// Reviewer.
    pub processed_by: Option<UserId>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Rejection reason.
    pub rejection_reason: Option<String>,
    /// Reviewer notes.
    pub notes: Option<String>,
    /// Attachments in submission order.
    pub attachments: Vec<Attachment>,
    /// Tracking number.
    pub tracking_number: String,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// A resident's document request.
///
/// ## Invariants
/// - `status == Rejected` implies a rejection reason.
/// - `processed_at` and `processed_by` are both set or both unset, and are set
///   whenever the status is approved, rejected or completed.
/// - `completed_at` is set exactly when the status is completed.
/// - Attachments and the tracking number never change after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    id: ApplicationId,
    user_id: UserId,
    document_type_id: DocumentTypeId,
    purpose: Purpose,
    status: ApplicationStatus,
    submitted_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    processed_by: Option<UserId>,
    completed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<RejectionReason>,
    notes: Option<String>,
    attachments: Vec<Attachment>,
    tracking_number: TrackingNumber,
    updated_at: DateTime<Utc>,
}

/// Validated submission input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    /// Owning resident.
    pub user_id: UserId,
    /// Requested document.
    pub document_type_id: DocumentTypeId,
    /// Purpose statement.
    pub purpose: Purpose,
    /// Attachments, validated as a set.
    pub attachments: Vec<AttachmentDraft>,
}

impl Application {
    /// Create a pending application.
    ///
    /// Attachments are validated here so a submission with zero, too many,
    /// oversized or disallowed files never produces a record.
    pub fn submit(
        input: NewApplication,
        tracking_number: TrackingNumber,
        now: DateTime<Utc>,
    ) -> Result<Self, ApplicationValidationError> {
        let attachments = attachment::validate_all(input.attachments, now)?;
        Ok(Self {
            id: ApplicationId::random(),
            user_id: input.user_id,
            document_type_id: input.document_type_id,
            purpose: input.purpose,
            status: ApplicationStatus::Pending,
            submitted_at: now,
            processed_at: None,
            processed_by: None,
            completed_at: None,
            rejection_reason: None,
            notes: None,
            attachments,
            tracking_number,
            updated_at: now,
        })
    }

    /// Apply a review decision to a pending application.
    pub fn process(
        self,
        decision: ReviewDecision,
        reviewer: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let target = decision.target_status();
        if self.status != ApplicationStatus::Pending {
            return Err(TransitionError::new(self.status, target));
        }
        let (rejection_reason, notes) = match decision {
            ReviewDecision::Approve { notes } => (None, notes),
            ReviewDecision::Reject { reason, notes } => (Some(reason), notes),
        };
        Ok(Self {
            status: target,
            processed_at: Some(now),
            processed_by: Some(reviewer),
            rejection_reason,
            notes,
            updated_at: now,
            ..self
        })
    }

    /// Withdraw a pending application.
    pub fn cancel(self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        self.move_to(ApplicationStatus::Cancelled, now)
    }

    /// Mark an approved application as released to the resident.
    pub fn complete(self, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        let mut next = self.move_to(ApplicationStatus::Completed, now)?;
        next.completed_at = Some(now);
        Ok(next)
    }

    fn move_to(self, target: ApplicationStatus, now: DateTime<Utc>) -> Result<Self, TransitionError> {
        if !self.status.can_transition_to(target) {
            return Err(TransitionError::new(self.status, target));
        }
        Ok(Self {
            status: target,
            updated_at: now,
            ..self
        })
    }

    /// Identifier.
    pub fn id(&self) -> &ApplicationId {
        &self.id
    }

    /// Owning resident.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Requested document.
    pub fn document_type_id(&self) -> &DocumentTypeId {
        &self.document_type_id
    }

    /// Purpose statement.
    pub fn purpose(&self) -> &Purpose {
        &self.purpose
    }

    /// Current status.
    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    /// Submission time.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Review time.
    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    /// Reviewer.
    pub fn processed_by(&self) -> Option<&UserId> {
        self.processed_by.as_ref()
    }

    /// Completion time.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Rejection reason.
    pub fn rejection_reason(&self) -> Option<&RejectionReason> {
        self.rejection_reason.as_ref()
    }

    /// Reviewer notes.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Attachments in submission order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Tracking number.
    pub fn tracking_number(&self) -> &TrackingNumber {
        &self.tracking_number
    }

    /// Last change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Keyset position of this record in the default ordering.
    pub fn cursor_key(&self) -> ApplicationCursorKey {
        ApplicationCursorKey {
            submitted_at: self.submitted_at,
            id: self.id,
        }
    }
}

impl TryFrom<ApplicationRecord> for Application {
    type Error = ApplicationValidationError;

    fn try_from(record: ApplicationRecord) -> Result<Self, Self::Error> {
        let rejection_reason = RejectionReason::parse(record.rejection_reason.as_deref())?;
        let status = record.status;
        if status == ApplicationStatus::Rejected && rejection_reason.is_none() {
            return Err(ApplicationValidationError::InconsistentRecord(
                "rejected without reason",
            ));
        }
        if record.processed_at.is_some() != record.processed_by.is_some() {
            return Err(ApplicationValidationError::InconsistentRecord(
                "processed_at and processed_by must be set together",
            ));
        }
        if status.is_reviewed() && record.processed_at.is_none() {
            return Err(ApplicationValidationError::InconsistentRecord(
                "reviewed without reviewer",
            ));
        }
        if (status == ApplicationStatus::Completed) != record.completed_at.is_some() {
            return Err(ApplicationValidationError::InconsistentRecord(
                "completed_at must match completed status",
            ));
        }
        let tracking_number = TrackingNumber::parse(&record.tracking_number).map_err(|_| {
            ApplicationValidationError::InconsistentRecord("malformed tracking number")
        })?;
        Ok(Self {
            id: record.id,
            user_id: record.user_id,
            document_type_id: record.document_type_id,
            purpose: Purpose::new(&record.purpose)?,
            status,
            submitted_at: record.submitted_at,
            processed_at: record.processed_at,
            processed_by: record.processed_by,
            completed_at: record.completed_at,
            rejection_reason,
            notes: record.notes,
            attachments: record.attachments,
            tracking_number,
            updated_at: record.updated_at,
        })
    }
}
