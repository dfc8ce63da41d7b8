//! Supporting documents attached to an application.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApplicationValidationError;

/// Largest accepted attachment, in bytes.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;
/// Most attachments one application may carry.
pub const MAX_ATTACHMENTS: usize = 5;

/// MIME types residents may upload.
pub const ALLOWED_FILE_TYPES: [FileType; 6] = [
    FileType::Jpeg,
    FileType::Gif,
    FileType::Png,
    FileType::Pdf,
    FileType::Doc,
    FileType::Docx,
];

/// Accepted attachment MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// `image/jpeg`
    Jpeg,
    /// `image/gif`
    Gif,
    /// `image/png`
    Png,
    /// `application/pdf`
    Pdf,
    /// `application/msword`
    Doc,
    /// Word OOXML document.
    Docx,
}

impl FileType {
    /// MIME string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Doc => "application/msword",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Match a MIME string, ignoring case and surrounding whitespace.
    pub fn from_mime(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        ALLOWED_FILE_TYPES
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FileType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FileType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_mime(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported file type {raw}")))
    }
}

/// Attachment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(Uuid);

impl AttachmentId {
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

/// Attachment metadata as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDraft {
    /// Original file name.
    pub file_name: String,
    /// Declared MIME type.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
}

/// Stored attachment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Identifier.
    pub id: AttachmentId,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: FileType,
    /// Size in bytes.
    pub file_size: u64,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    fn from_draft(
        index: usize,
        draft: AttachmentDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ApplicationValidationError> {
        let file_name = draft.file_name.trim();
        if file_name.is_empty() {
            return Err(ApplicationValidationError::BlankFileName { index });
        }
        if draft.file_size == 0 {
            return Err(ApplicationValidationError::EmptyAttachment { index });
        }
        if draft.file_size > MAX_ATTACHMENT_BYTES {
            return Err(ApplicationValidationError::AttachmentTooLarge {
                index,
                max: MAX_ATTACHMENT_BYTES,
            });
        }
        let file_type = FileType::from_mime(&draft.file_type).ok_or_else(|| {
            ApplicationValidationError::UnsupportedFileType {
                index,
                file_type: draft.file_type.clone(),
            }
        })?;
        Ok(Self {
            id: AttachmentId::random(),
            file_name: file_name.to_owned(),
            file_type,
            file_size: draft.file_size,
            uploaded_at: now,
        })
    }
}

pub(super) fn validate_all(
    drafts: Vec<AttachmentDraft>,
    now: DateTime<Utc>,
) -> Result<Vec<Attachment>, ApplicationValidationError> {
    if drafts.is_empty() {
        return Err(ApplicationValidationError::NoAttachments);
    }
    if drafts.len() > MAX_ATTACHMENTS {
        return Err(ApplicationValidationError::TooManyAttachments {
            max: MAX_ATTACHMENTS,
        });
    }
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| Attachment::from_draft(index, draft, now))
        .collect()
}
