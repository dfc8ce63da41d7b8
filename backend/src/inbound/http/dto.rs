//! Request and response payloads for the REST API.
//!
//! Domain types stay free of `utoipa`; these DTOs carry the OpenAPI schemas
//! and the camelCase wire shape.

use chrono::{DateTime, Utc};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Application, Attachment, AttachmentDraft, DashboardStats, DocumentType, ProcessAction,
    ProfileUpdateDraft, RegistrationDraft, User,
};

/// `POST /api/v1/login` body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "juan@example.ph")]
    pub email: String,
    pub password: String,
}

/// `POST /api/v1/register` body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[schema(example = "09171234567")]
    pub contact_number: String,
    pub address: String,
}

impl From<RegisterRequest> for RegistrationDraft {
    fn from(value: RegisterRequest) -> Self {
        Self {
            email: value.email,
            password: value.password,
            confirm_password: value.confirm_password,
            first_name: value.first_name,
            last_name: value.last_name,
            middle_name: value.middle_name,
            contact_number: value.contact_number,
            address: value.address,
        }
    }
}

/// `PATCH /api/v1/me` body; absent keys are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// An empty string clears the middle name.
    pub middle_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
}

impl From<ProfileUpdateRequest> for ProfileUpdateDraft {
    fn from(value: ProfileUpdateRequest) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
            middle_name: value.middle_name,
            contact_number: value.contact_number,
            address: value.address,
        }
    }
}

/// Signed-in user as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub contact_number: String,
    pub address: String,
    #[schema(example = "resident")]
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().as_ref().to_owned(),
            first_name: user.first_name().as_ref().to_owned(),
            last_name: user.last_name().as_ref().to_owned(),
            middle_name: user.middle_name().map(|name| name.as_ref().to_owned()),
            contact_number: user.contact_number().as_ref().to_owned(),
            address: user.address().as_ref().to_owned(),
            role: user.role().as_str().to_owned(),
            is_active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Requestable document.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeResponse {
    pub id: String,
    #[schema(example = "Barangay Clearance")]
    pub name: String,
    pub description: String,
    pub requirements: Vec<String>,
    #[schema(example = 5000)]
    pub fee_centavos: u32,
    /// Display form, e.g. `₱50.00` or `Free`.
    pub fee: String,
    #[schema(example = "1-2 business days")]
    pub processing_time: String,
}

impl From<&DocumentType> for DocumentTypeResponse {
    fn from(doc: &DocumentType) -> Self {
        Self {
            id: doc.id().to_string(),
            name: doc.name().to_owned(),
            description: doc.description().to_owned(),
            requirements: doc.requirements().to_vec(),
            fee_centavos: doc.fee().centavos(),
            fee: doc.fee().to_string(),
            processing_time: doc.processing_time().to_owned(),
        }
    }
}

/// Attachment metadata in a submission.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRequest {
    #[schema(example = "valid-id.pdf")]
    pub file_name: String,
    #[schema(example = "application/pdf")]
    pub file_type: String,
    pub file_size: u64,
}

impl From<AttachmentRequest> for AttachmentDraft {
    fn from(value: AttachmentRequest) -> Self {
        Self {
            file_name: value.file_name,
            file_type: value.file_type,
            file_size: value.file_size,
        }
    }
}

/// `POST /api/v1/applications` body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationBody {
    pub document_type_id: String,
    #[schema(example = "Employment requirement")]
    pub purpose: String,
    #[schema(min_items = 1, max_items = 5)]
    pub attachments: Vec<AttachmentRequest>,
}

/// `POST /api/v1/applications/{id}/process` body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessApplicationBody {
    #[schema(value_type = String, example = "approve")]
    pub action: ProcessAction,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Stored attachment metadata.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Attachment> for AttachmentResponse {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id.as_uuid().to_string(),
            file_name: attachment.file_name.clone(),
            file_type: attachment.file_type.as_str().to_owned(),
            file_size: attachment.file_size,
            uploaded_at: attachment.uploaded_at,
        }
    }
}

/// Application as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: String,
    pub user_id: String,
    pub document_type_id: String,
    pub purpose: String,
    #[schema(example = "pending")]
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub attachments: Vec<AttachmentResponse>,
    #[schema(example = "BA12345678X9Z0")]
    pub tracking_number: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Application> for ApplicationResponse {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id().to_string(),
            user_id: app.user_id().to_string(),
            document_type_id: app.document_type_id().to_string(),
            purpose: app.purpose().as_ref().to_owned(),
            status: app.status().as_str().to_owned(),
            submitted_at: app.submitted_at(),
            processed_at: app.processed_at(),
            processed_by: app.processed_by().map(ToString::to_string),
            completed_at: app.completed_at(),
            rejection_reason: app.rejection_reason().map(|r| r.as_ref().to_owned()),
            notes: app.notes().map(str::to_owned),
            attachments: app.attachments().iter().map(AttachmentResponse::from).collect(),
            tracking_number: app.tracking_number().as_str().to_owned(),
            updated_at: app.updated_at(),
        }
    }
}

/// Navigation links for a page.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageLinksResponse {
    #[serde(rename = "self")]
    pub self_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// One page of applications.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplicationPageResponse {
    pub data: Vec<ApplicationResponse>,
    pub limit: usize,
    pub links: PageLinksResponse,
}

impl From<Paginated<ApplicationResponse>> for ApplicationPageResponse {
    fn from(page: Paginated<ApplicationResponse>) -> Self {
        Self {
            data: page.data,
            limit: page.limit,
            links: PageLinksResponse {
                self_: page.links.self_,
                next: page.links.next,
            },
        }
    }
}

/// Dashboard counters and recent activity.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub completed: u64,
    /// Registered users; admins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_count: Option<u64>,
    pub recent: Vec<ApplicationResponse>,
}

impl From<&DashboardStats> for DashboardResponse {
    fn from(stats: &DashboardStats) -> Self {
        Self {
            total: stats.counts.total,
            pending: stats.counts.pending,
            approved: stats.counts.approved,
            completed: stats.counts.completed,
            user_count: stats.user_count,
            recent: stats.recent.iter().map(ApplicationResponse::from).collect(),
        }
    }
}

/// Query string for `GET /api/v1/applications`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListApplicationsQuery {
    /// Opaque cursor from a previous page's `next` link.
    pub cursor: Option<String>,
    /// Page size, 1 to 50.
    pub limit: Option<usize>,
    /// Exact status, e.g. `pending`.
    pub status: Option<String>,
    pub document_type_id: Option<String>,
    /// Case-insensitive match on purpose or tracking number.
    pub search: Option<String>,
    /// RFC 3339 lower bound on submission time.
    pub submitted_from: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on submission time.
    pub submitted_to: Option<DateTime<Utc>>,
}
