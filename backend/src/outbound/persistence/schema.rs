//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate them with `diesel print-schema`
//! or update them by hand.

diesel::table! {
    /// Resident and staff profiles. `id` matches the identity store.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        middle_name -> Nullable<Varchar>,
        contact_number -> Varchar,
        address -> Varchar,
        role -> Varchar,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Requestable documents.
    document_types (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        requirements -> Array<Text>,
        fee_centavos -> Int8,
        processing_time -> Varchar,
        is_active -> Bool,
    }
}

diesel::table! {
    /// Document requests. A check constraint requires a rejection reason on
    /// rejected rows; `tracking_number` is unique.
    applications (id) {
        id -> Uuid,
        user_id -> Uuid,
        document_type_id -> Uuid,
        purpose -> Text,
        status -> Varchar,
        submitted_at -> Timestamptz,
        processed_at -> Nullable<Timestamptz>,
        processed_by -> Nullable<Uuid>,
        completed_at -> Nullable<Timestamptz>,
        rejection_reason -> Nullable<Text>,
        notes -> Nullable<Text>,
        tracking_number -> Varchar,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Attachment metadata, ordered by `position` within an application.
    application_attachments (id) {
        id -> Uuid,
        application_id -> Uuid,
        position -> Int4,
        file_name -> Varchar,
        file_type -> Varchar,
        file_size -> Int8,
        uploaded_at -> Timestamptz,
    }
}

diesel::joinable!(applications -> document_types (document_type_id));
diesel::joinable!(application_attachments -> applications (application_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    document_types,
    applications,
    application_attachments,
);
