//! Account API handlers.
//!
//! ```text
//! POST /api/v1/login {"email":"juan@example.ph","password":"secret1"}
//! POST /api/v1/register
//! POST /api/v1/logout
//! GET /api/v1/me
//! PATCH /api/v1/me {"address":"99 Luna St"}
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use tracing::{info, warn};

use crate::domain::{
    LoginCredentials, ProfileUpdate, ProfileUpdateDraft, Registration, RegistrationDraft,
    SessionError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::authorize;
use crate::inbound::http::dto::{
    LoginRequest, ProfileUpdateRequest, RegisterRequest, UserResponse,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionCookie;
use crate::inbound::http::state::HttpState;

/// Authenticate a user and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Identity store unavailable", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionCookie,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(SessionError::from)?;
    let account = state.accounts.login(&credentials).await?;
    session.establish(account.user.id(), &account.token)?;
    info!(user_id = %account.user.id(), "signed in");
    Ok(web::Json(UserResponse::from(&account.user)))
}

/// Create a resident account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Identity store unavailable", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionCookie,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(RegistrationDraft::from(payload.into_inner()))
        .map_err(SessionError::from)?;
    let account = state.accounts.register(&registration).await?;
    session.establish(account.user.id(), &account.token)?;
    info!(user_id = %account.user.id(), "resident registered");
    Ok(HttpResponse::Created().json(UserResponse::from(&account.user)))
}

/// End the current session.
///
/// Always succeeds; identity store failures are logged and the cookie is
/// cleared regardless.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Signed out")),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(state: web::Data<HttpState>, session: SessionCookie) -> HttpResponse {
    match session.token() {
        Ok(Some(token)) => {
            if let Err(error) = state.accounts.logout(&token).await {
                warn!(%error, "remote sign-out failed");
            }
        }
        Ok(None) => {}
        Err(error) => warn!(%error, "unreadable session during sign-out"),
    }
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Current user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Signed-in user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Account deactivated", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionCookie,
) -> ApiResult<web::Json<UserResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Update the signed-in user's profile.
#[utoipa::path(
    patch,
    path = "/api/v1/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Account deactivated", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "updateCurrentUser"
)]
#[patch("/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    session: SessionCookie,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let update = ProfileUpdate::try_from(ProfileUpdateDraft::from(payload.into_inner()))
        .map_err(SessionError::from)?;
    let updated = state.accounts.update_profile(user.id(), &update).await?;
    Ok(web::Json(UserResponse::from(&updated)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::domain::ports::UserProfileRepository;
    use crate::domain::{User, UserDraft};
    use crate::inbound::http::test_utils::{
        login_request, session_cookie, test_app, test_portal,
    };
    use crate::test_support::users::resident;

    fn registration_body(email: &str, confirm: &str) -> Value {
        json!({
            "email": email,
            "password": "secret1",
            "confirmPassword": confirm,
            "firstName": "Maria",
            "lastName": "Santos",
            "contactNumber": "09181234567",
            "address": "7 Rizal Ave, Barangay Uno"
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn login_sets_cookie_and_returns_profile() {
        let portal = test_portal(&[resident()]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;

        let response =
            actix_test::call_service(&app, login_request("juan@example.ph").to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["email"], "juan@example.ph");
        assert_eq!(body["role"], "resident");

        let me = actix_test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(cookie)
            .to_request();
        let me: Value = actix_test::call_and_read_body_json(&app, me).await;
        assert_eq!(me["firstName"], "Juan");
    }

    #[rstest]
    #[actix_web::test]
    async fn wrong_password_is_unauthorised() {
        let portal = test_portal(&[resident()]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": "juan@example.ph", "password": "wrong-password" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("not-an-email", "password")]
    #[case("juan@example.ph", "")]
    #[actix_web::test]
    async fn malformed_credentials_are_rejected(#[case] email: &str, #[case] password: &str) {
        let portal = test_portal(&[]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert!(body["details"]["field"].is_string());
    }

    #[rstest]
    #[actix_web::test]
    async fn register_signs_in_new_resident() {
        let portal = test_portal(&[]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/register")
            .set_json(registration_body("maria@example.ph", "secret1"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = session_cookie(&response);

        let me = actix_test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(cookie)
            .to_request();
        let me: Value = actix_test::call_and_read_body_json(&app, me).await;
        assert_eq!(me["email"], "maria@example.ph");
        assert_eq!(me["role"], "resident");
        assert_eq!(me["isActive"], true);
    }

    #[rstest]
    #[actix_web::test]
    async fn mismatched_confirmation_is_a_validation_error() {
        let portal = test_portal(&[]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/register")
            .set_json(registration_body("maria@example.ph", "secret2"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn duplicate_email_conflicts() {
        let portal = test_portal(&[resident()]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/register")
            .set_json(registration_body("juan@example.ph", "secret1"))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[actix_web::test]
    async fn logout_ends_the_session() {
        let portal = test_portal(&[resident()]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let response =
            actix_test::call_service(&app, login_request("juan@example.ph").to_request()).await;
        let cookie = session_cookie(&response);

        let logout = actix_test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, logout).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cleared = session_cookie(&response);

        let me = actix_test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(cleared)
            .to_request();
        let response = actix_test::call_service(&app, me).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn signed_out_cookie_cannot_be_replayed() {
        let portal = test_portal(&[resident()]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let response =
            actix_test::call_service(&app, login_request("juan@example.ph").to_request()).await;
        let cookie = session_cookie(&response);

        let logout = actix_test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(cookie.clone())
            .to_request();
        let response = actix_test::call_service(&app, logout).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let me = actix_test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, me).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn anonymous_logout_still_succeeds() {
        let portal = test_portal(&[]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let request = actix_test::TestRequest::post()
            .uri("/api/v1/logout")
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[rstest]
    #[actix_web::test]
    async fn profile_update_merges_fields() {
        let portal = test_portal(&[resident()]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let response =
            actix_test::call_service(&app, login_request("juan@example.ph").to_request()).await;
        let cookie = session_cookie(&response);

        let request = actix_test::TestRequest::patch()
            .uri("/api/v1/me")
            .cookie(cookie)
            .set_json(json!({ "address": "99 Luna St, Barangay Dos" }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["address"], "99 Luna St, Barangay Dos");
        assert_eq!(body["firstName"], "Juan");
    }

    #[rstest]
    #[actix_web::test]
    async fn deactivated_account_is_forbidden() {
        let portal = test_portal(&[resident()]).await;
        let app = actix_test::init_service(test_app(portal.state)).await;
        let response =
            actix_test::call_service(&app, login_request("juan@example.ph").to_request()).await;
        let cookie = session_cookie(&response);

        let mut draft = UserDraft::from(resident());
        draft.is_active = false;
        let deactivated = User::try_from(draft).expect("valid user");
        portal
            .profiles
            .update_profile(&deactivated)
            .await
            .expect("profile stored");

        let me = actix_test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(cookie)
            .to_request();
        let response = actix_test::call_service(&app, me).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
