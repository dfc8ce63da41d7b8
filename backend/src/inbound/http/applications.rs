//! Application lifecycle handlers.
//!
//! ```text
//! POST /api/v1/applications
//! GET /api/v1/applications?status=pending&limit=10
//! GET /api/v1/applications/stats
//! GET /api/v1/applications/track/BA12345678X9Z0
//! GET /api/v1/applications/{id}
//! POST /api/v1/applications/{id}/process {"action":"approve"}
//! POST /api/v1/applications/{id}/cancel
//! POST /api/v1/applications/{id}/complete
//! ```
//!
//! Visibility follows the caller's role: residents only ever see their own
//! applications, and a foreign id reads as `404`.

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::{Cursor, PageParams, Paginated, PaginationLinks};
use serde_json::json;

use crate::domain::ports::{ProcessApplicationRequest, SubmitApplicationRequest};
use crate::domain::{
    ApplicationFilter, ApplicationId, ApplicationStatus, DocumentTypeId, Error, LifecycleError,
    Role,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::dto::{
    ApplicationPageResponse, ApplicationResponse, DashboardResponse, ListApplicationsQuery,
    ProcessApplicationBody, SubmitApplicationBody,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionCookie;
use crate::inbound::http::state::HttpState;

fn parse_application_id(raw: &str) -> ApiResult<ApplicationId> {
    ApplicationId::new(raw).map_err(|err| Error::from(LifecycleError::from(err)))
}

fn parse_document_type_id(raw: &str) -> ApiResult<DocumentTypeId> {
    DocumentTypeId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "documentTypeId",
            "code": "invalid_document_type_id",
        }))
    })
}

/// Submit a new application for the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/applications",
    request_body = SubmitApplicationBody,
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Account deactivated", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "submitApplication"
)]
#[post("/applications")]
pub async fn submit_application(
    state: web::Data<HttpState>,
    session: SessionCookie,
    payload: web::Json<SubmitApplicationBody>,
) -> ApiResult<HttpResponse> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let body = payload.into_inner();
    let request = SubmitApplicationRequest {
        document_type_id: parse_document_type_id(&body.document_type_id)?,
        purpose: body.purpose,
        attachments: body.attachments.into_iter().map(Into::into).collect(),
    };
    let application = state.applications.submit(&user, request).await?;
    Ok(HttpResponse::Created().json(ApplicationResponse::from(&application)))
}

fn filter_from_query(query: &ListApplicationsQuery) -> ApiResult<ApplicationFilter> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ApplicationStatus>)
        .transpose()
        .map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "status", "code": "unknown_status" }))
        })?;
    let document_type_id = query
        .document_type_id
        .as_deref()
        .map(parse_document_type_id)
        .transpose()?;
    Ok(ApplicationFilter {
        status,
        document_type_id,
        search: query.search.clone(),
        submitted_from: query.submitted_from,
        submitted_to: query.submitted_to,
    })
}

/// List applications visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/applications",
    params(ListApplicationsQuery),
    responses(
        (status = 200, description = "Page of applications", body = ApplicationPageResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "listApplications"
)]
#[get("/applications")]
pub async fn list_applications(
    state: web::Data<HttpState>,
    session: SessionCookie,
    request: HttpRequest,
    query: web::Query<ListApplicationsQuery>,
) -> ApiResult<web::Json<ApplicationPageResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let query = query.into_inner();
    let filter = filter_from_query(&query)?;
    let params = PageParams::new(query.cursor, query.limit).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "code": "invalid_page_params" }))
    })?;

    let page = state
        .applications_query
        .list(&user, &filter, &params)
        .await?;
    let next = page
        .next
        .map(|key| Cursor::new(key).encode())
        .transpose()
        .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))?;
    let links = PaginationLinks::from_request(&request.full_url(), params.limit(), next.as_deref());
    let data: Vec<ApplicationResponse> = page.items.iter().map(ApplicationResponse::from).collect();
    Ok(web::Json(ApplicationPageResponse::from(Paginated::new(
        data,
        params.limit(),
        links,
    ))))
}

/// Dashboard counters for the caller's scope.
#[utoipa::path(
    get,
    path = "/api/v1/applications/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "applicationStats"
)]
#[get("/applications/stats")]
pub async fn application_stats(
    state: web::Data<HttpState>,
    session: SessionCookie,
) -> ApiResult<web::Json<DashboardResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let stats = state.applications_query.dashboard_stats(&user).await?;
    Ok(web::Json(DashboardResponse::from(&stats)))
}

/// Look an application up by tracking number.
#[utoipa::path(
    get,
    path = "/api/v1/applications/track/{tracking_number}",
    params(("tracking_number" = String, Path, description = "Tracking number, e.g. BA12345678X9Z0")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "trackApplication"
)]
#[get("/applications/track/{tracking_number}")]
pub async fn track_application(
    state: web::Data<HttpState>,
    session: SessionCookie,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let application = state
        .applications_query
        .find_by_tracking_number(&user, &path)
        .await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Fetch one application.
#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "getApplication"
)]
#[get("/applications/{id}")]
pub async fn get_application(
    state: web::Data<HttpState>,
    session: SessionCookie,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let id = parse_application_id(&path)?;
    let application = state.applications_query.get(&user, &id).await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Approve or reject a pending application.
#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/process",
    params(("id" = String, Path, description = "Application id")),
    request_body = ProcessApplicationBody,
    responses(
        (status = 200, description = "Decision recorded", body = ApplicationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Administrators only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Invalid state transition", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "processApplication"
)]
#[post("/applications/{id}/process")]
pub async fn process_application(
    state: web::Data<HttpState>,
    session: SessionCookie,
    path: web::Path<String>,
    payload: web::Json<ProcessApplicationBody>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, Some(Role::Admin)).await?;
    let application_id = parse_application_id(&path)?;
    let body = payload.into_inner();
    let request = ProcessApplicationRequest {
        application_id,
        action: body.action,
        rejection_reason: body.rejection_reason,
        notes: body.notes,
    };
    let application = state.applications.process(&user, request).await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Withdraw one of the caller's pending applications.
#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/cancel",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application cancelled", body = ApplicationResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the applicant", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Invalid state transition", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "cancelApplication"
)]
#[post("/applications/{id}/cancel")]
pub async fn cancel_application(
    state: web::Data<HttpState>,
    session: SessionCookie,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let id = parse_application_id(&path)?;
    let application = state.applications.cancel(&user, &id).await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Mark an approved application as released to the applicant.
#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/complete",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application completed", body = ApplicationResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Administrators only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Invalid state transition", body = ErrorSchema)
    ),
    tags = ["applications"],
    operation_id = "completeApplication"
)]
#[post("/applications/{id}/complete")]
pub async fn complete_application(
    state: web::Data<HttpState>,
    session: SessionCookie,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, Some(Role::Admin)).await?;
    let id = parse_application_id(&path)?;
    let application = state.applications.complete(&user, &id).await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

#[cfg(test)]
#[path = "applications_tests.rs"]
mod tests;
