//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live with
//! the repository that reads them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{application_attachments, applications, document_types, users};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub contact_number: String,
    pub address: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new profiles.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub contact_number: &'a str,
    pub address: &'a str,
    pub role: &'a str,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for self-service profile edits.
///
/// `middle_name` is always written so clearing it sets the column to NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileUpdate<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub middle_name: Option<&'a str>,
    pub contact_number: &'a str,
    pub address: &'a str,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Row struct for reading from the document_types table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = document_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DocumentTypeRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub fee_centavos: i64,
    pub processing_time: String,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

/// Row struct for reading from and inserting into the applications table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_type_id: Uuid,
    pub purpose: String,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub tracking_number: String,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for status transitions. Attachments and the tracking number
/// are never part of it.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = applications)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ApplicationStatusUpdate<'a> {
    pub status: &'a str,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for the application_attachments table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = application_attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AttachmentRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub position: i32,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}
