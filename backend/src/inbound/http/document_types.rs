//! Document catalogue handler.

use actix_web::{get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::dto::DocumentTypeResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionCookie;
use crate::inbound::http::state::HttpState;

/// Active document types, sorted by name.
#[utoipa::path(
    get,
    path = "/api/v1/document-types",
    responses(
        (status = 200, description = "Requestable documents", body = [DocumentTypeResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Catalogue unavailable", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "listDocumentTypes"
)]
#[get("/document-types")]
pub async fn list_document_types(
    state: web::Data<HttpState>,
    session: SessionCookie,
) -> ApiResult<web::Json<Vec<DocumentTypeResponse>>> {
    authorize(state.accounts.as_ref(), &session, None).await?;
    let types = state.applications_query.document_types().await?;
    Ok(web::Json(types.iter().map(DocumentTypeResponse::from).collect()))
}
