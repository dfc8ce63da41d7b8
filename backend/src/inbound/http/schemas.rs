//! OpenAPI schemas for domain error types.
//!
//! The domain stays free of `utoipa`; these mirrors register the error
//! payload under the domain type names.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// Malformed input or failed validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Not signed in or bad credentials.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Signed in without the required role, or deactivated.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// Missing or invisible resource.
    #[schema(rename = "not_found")]
    NotFound,
    /// Duplicate registration or a forbidden status transition.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing service is temporarily unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// Unexpected server failure; details are redacted.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[serde(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message.
    #[schema(example = "purpose must be at least 10 characters")]
    message: String,
    /// Request correlation id, also sent as the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context such as `{"field":"purpose","code":"purpose_too_short"}`.
    details: Option<serde_json::Value>,
}
