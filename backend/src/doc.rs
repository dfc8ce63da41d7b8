//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler, the request and response DTOs,
//! and the error mirrors from [`crate::inbound::http::schemas`]. The
//! document is served by Swagger UI in debug builds and printed by the
//! `openapi-dump` binary.

use crate::inbound::http::dto::{
    ApplicationPageResponse, ApplicationResponse, AttachmentRequest, AttachmentResponse,
    DashboardResponse, DocumentTypeResponse, LoginRequest, PageLinksResponse,
    ProcessApplicationBody, ProfileUpdateRequest, RegisterRequest, SubmitApplicationBody,
    UserResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Barangay portal API",
        description = "Resident accounts, document requests, and the review workflow."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::accounts::update_current_user,
        crate::inbound::http::document_types::list_document_types,
        crate::inbound::http::applications::submit_application,
        crate::inbound::http::applications::list_applications,
        crate::inbound::http::applications::application_stats,
        crate::inbound::http::applications::track_application,
        crate::inbound::http::applications::get_application,
        crate::inbound::http::applications::process_application,
        crate::inbound::http::applications::cancel_application,
        crate::inbound::http::applications::complete_application,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        RegisterRequest,
        ProfileUpdateRequest,
        UserResponse,
        DocumentTypeResponse,
        AttachmentRequest,
        AttachmentResponse,
        SubmitApplicationBody,
        ProcessApplicationBody,
        ApplicationResponse,
        PageLinksResponse,
        ApplicationPageResponse,
        DashboardResponse,
    )),
    tags(
        (name = "accounts", description = "Sign-in, registration, and profiles"),
        (name = "applications", description = "Document requests and their review"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the registered paths and schema fields.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/login")]
    #[case("/api/v1/register")]
    #[case("/api/v1/me")]
    #[case("/api/v1/document-types")]
    #[case("/api/v1/applications")]
    #[case("/api/v1/applications/stats")]
    #[case("/api/v1/applications/track/{tracking_number}")]
    #[case("/api/v1/applications/{id}/process")]
    #[case("/health/ready")]
    fn documents_every_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    fn error_schema_uses_wire_field_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[rstest]
    fn application_schema_is_camel_case() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let application = schemas
            .get("ApplicationResponse")
            .expect("ApplicationResponse schema");

        assert_object_schema_has_field(application, "trackingNumber");
        assert_object_schema_has_field(application, "rejectionReason");
    }
}
