//! Reqwest-backed identity store for a hosted GoTrue-compatible auth API.
//!
//! This adapter owns transport details only: endpoint layout, the `apikey`
//! header, bearer tokens and mapping HTTP failures onto
//! [`IdentityStoreError`]. Profile data never passes through it beyond the
//! sign-up metadata the auth service stores alongside the identity.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{Identity, IdentitySession, IdentityStore, IdentityStoreError};
use crate::domain::{Email, LoginCredentials, Registration, SessionToken, UserId};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the hosted auth API.
#[derive(Debug, Clone)]
pub struct HttpIdentityConfig {
    /// Base URL, e.g. `https://project.example.co/auth/v1/`.
    pub base_url: Url,
    /// Public API key sent as the `apikey` header.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpIdentityConfig {
    /// Settings with the default timeout.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Identity store that delegates to a remote auth service.
pub struct HttpIdentityStore {
    client: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    first_name: &'a str,
    last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    middle_name: Option<&'a str>,
    contact_number: &'a str,
    address: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: Uuid,
    email: String,
}

#[derive(Debug, Deserialize)]
struct SessionDto {
    access_token: Option<String>,
    user: Option<UserDto>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDto {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorDto {
    fn message(&self) -> String {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("request rejected")
            .to_owned()
    }

    fn is_duplicate(&self) -> bool {
        self.error_code.as_deref() == Some("user_already_exists")
            || self.message().to_lowercase().contains("already registered")
    }
}

impl HttpIdentityStore {
    /// Build an adapter from its settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HttpIdentityConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityStoreError> {
        self.base_url
            .join(path)
            .map_err(|err| IdentityStoreError::rejected(format!("invalid endpoint {path}: {err}")))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn session_from(
        &self,
        response: Response,
        fallback_email: &Email,
    ) -> Result<IdentitySession, IdentityStoreError> {
        let body: SessionDto = response.json().await.map_err(map_transport_error)?;
        let token = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| IdentityStoreError::rejected("no session issued"))?;
        let user = body
            .user
            .ok_or_else(|| IdentityStoreError::rejected("session without user"))?;
        Ok(IdentitySession {
            identity: identity_from(user, fallback_email),
            token: SessionToken::new(token),
        })
    }
}

fn identity_from(user: UserDto, fallback_email: &Email) -> Identity {
    let email = Email::new(&user.email).unwrap_or_else(|_| fallback_email.clone());
    Identity {
        user_id: UserId::from_uuid(user.id),
        email,
    }
}

fn map_transport_error(error: reqwest::Error) -> IdentityStoreError {
    debug!(%error, "identity store transport failure");
    IdentityStoreError::unavailable(error.to_string())
}

async fn error_body(response: Response) -> ErrorDto {
    response.json().await.unwrap_or_default()
}

fn map_status_error(status: StatusCode, body: &ErrorDto) -> IdentityStoreError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        IdentityStoreError::unavailable(format!("status {}: {}", status.as_u16(), body.message()))
    } else {
        IdentityStoreError::rejected(body.message())
    }
}

#[async_trait]
impl IdentityStore for HttpIdentityStore {
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<IdentitySession, IdentityStoreError> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .request(self.client.post(url))
            .json(&PasswordGrant {
                email: credentials.email().as_ref(),
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(IdentityStoreError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(map_status_error(status, &error_body(response).await));
        }
        self.session_from(response, credentials.email()).await
    }

    async fn sign_up(
        &self,
        registration: &Registration,
    ) -> Result<IdentitySession, IdentityStoreError> {
        let response = self
            .request(self.client.post(self.endpoint("signup")?))
            .json(&SignUpRequest {
                email: registration.email().as_ref(),
                password: registration.password(),
                data: SignUpMetadata {
                    first_name: registration.first_name().as_ref(),
                    last_name: registration.last_name().as_ref(),
                    middle_name: registration.middle_name().map(AsRef::as_ref),
                    contact_number: registration.contact_number().as_ref(),
                    address: registration.address().as_ref(),
                },
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            if body.is_duplicate() {
                return Err(IdentityStoreError::duplicate_email(
                    registration.email().as_ref(),
                ));
            }
            return Err(map_status_error(status, &body));
        }
        self.session_from(response, registration.email()).await
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityStoreError> {
        let response = self
            .request(self.client.post(self.endpoint("logout")?))
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        // Unknown tokens are already signed out.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(map_status_error(status, &error_body(response).await))
    }

    async fn session(&self, token: &SessionToken) -> Result<Option<Identity>, IdentityStoreError> {
        let response = self
            .request(self.client.get(self.endpoint("user")?))
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(map_status_error(status, &error_body(response).await));
        }
        let user: UserDto = response.json().await.map_err(map_transport_error)?;
        let email = Email::new(&user.email)
            .map_err(|err| IdentityStoreError::rejected(format!("invalid email: {err}")))?;
        Ok(Some(Identity {
            user_id: UserId::from_uuid(user.id),
            email,
        }))
    }

    async fn delete_identity(&self, user_id: &UserId) -> Result<(), IdentityStoreError> {
        let url = self.endpoint(&format!("admin/users/{user_id}"))?;
        let response = self
            .request(self.client.delete(url))
            .bearer_auth(self.api_key.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(map_status_error(status, &error_body(response).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
    use rstest::rstest;
    use serde_json::{Value, json};

    const USER_ID: &str = "3f1c8b4e-6d52-4c1a-9a0f-2b7d4e5f6a70";

    async fn token(body: web::Json<Value>) -> HttpResponse {
        if body["password"] == "secret1" {
            HttpResponse::Ok().json(json!({
                "access_token": "remote-token",
                "user": { "id": USER_ID, "email": body["email"] },
            }))
        } else {
            HttpResponse::BadRequest().json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials",
            }))
        }
    }

    async fn signup(body: web::Json<Value>) -> HttpResponse {
        if body["email"] == "taken@example.ph" {
            HttpResponse::UnprocessableEntity().json(json!({
                "error_code": "user_already_exists",
                "msg": "User already registered",
            }))
        } else {
            HttpResponse::Ok().json(json!({
                "access_token": "fresh-token",
                "user": { "id": USER_ID, "email": body["email"] },
            }))
        }
    }

    async fn user(req: HttpRequest) -> HttpResponse {
        let bearer = req
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok());
        let keyed = req.headers().contains_key("apikey");
        match bearer {
            Some("Bearer remote-token") if keyed => {
                HttpResponse::Ok().json(json!({ "id": USER_ID, "email": "juan@example.ph" }))
            }
            _ => HttpResponse::Unauthorized().finish(),
        }
    }

    async fn delete_user(req: HttpRequest, path: web::Path<String>) -> HttpResponse {
        let admin = req
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bearer anon-key");
        match (admin, path.as_str()) {
            (false, _) => HttpResponse::Forbidden().json(json!({ "msg": "not admin" })),
            (true, USER_ID) => HttpResponse::Ok().finish(),
            (true, _) => HttpResponse::NotFound().json(json!({ "msg": "User not found" })),
        }
    }

    async fn logout() -> HttpResponse {
        HttpResponse::ServiceUnavailable().json(json!({ "msg": "maintenance" }))
    }

    fn start_stub() -> (HttpIdentityStore, actix_web::dev::ServerHandle) {
        let server = HttpServer::new(|| {
            App::new().service(
                web::scope("/auth/v1")
                    .route("/token", web::post().to(token))
                    .route("/signup", web::post().to(signup))
                    .route("/user", web::get().to(user))
                    .route("/logout", web::post().to(logout))
                    .route("/admin/users/{id}", web::delete().to(delete_user)),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind stub");
        let addr = server.addrs()[0];
        let running = server.run();
        let handle = running.handle();
        actix_web::rt::spawn(running);
        let base = Url::parse(&format!("http://{addr}/auth/v1")).expect("stub url");
        let store =
            HttpIdentityStore::new(HttpIdentityConfig::new(base, "anon-key")).expect("client");
        (store, handle)
    }

    fn registration(email: &str) -> Registration {
        Registration::try_from(crate::domain::RegistrationDraft {
            email: email.to_owned(),
            password: "secret1".to_owned(),
            confirm_password: "secret1".to_owned(),
            first_name: "Juan".to_owned(),
            last_name: "Dela Cruz".to_owned(),
            middle_name: None,
            contact_number: "09171234567".to_owned(),
            address: "12 Mabini St, Barangay Uno".to_owned(),
        })
        .expect("valid registration")
    }

    #[rstest]
    #[actix_web::test]
    async fn password_grant_opens_a_session() {
        let (store, handle) = start_stub();
        let credentials =
            LoginCredentials::try_from_parts("juan@example.ph", "secret1").expect("credentials");
        let session = store.sign_in(&credentials).await.expect("sign in");
        assert_eq!(session.token.expose(), "remote-token");
        assert_eq!(session.identity.user_id.to_string(), USER_ID);

        let wrong =
            LoginCredentials::try_from_parts("juan@example.ph", "nope").expect("credentials");
        let err = store.sign_in(&wrong).await.expect_err("bad password");
        assert_eq!(err, IdentityStoreError::InvalidCredentials);
        handle.stop(true).await;
    }

    #[rstest]
    #[actix_web::test]
    async fn sign_up_maps_duplicates() {
        let (store, handle) = start_stub();
        let created = store
            .sign_up(&registration("maria@example.ph"))
            .await
            .expect("sign up");
        assert_eq!(created.identity.email.as_ref(), "maria@example.ph");

        let err = store
            .sign_up(&registration("taken@example.ph"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, IdentityStoreError::DuplicateEmail { .. }));
        handle.stop(true).await;
    }

    #[rstest]
    #[actix_web::test]
    async fn session_lookup_treats_unauthorised_as_expired() {
        let (store, handle) = start_stub();
        let known = store
            .session(&SessionToken::new("remote-token"))
            .await
            .expect("lookup");
        assert!(known.is_some());
        let stale = store
            .session(&SessionToken::new("stale"))
            .await
            .expect("lookup");
        assert!(stale.is_none());
        handle.stop(true).await;
    }

    #[rstest]
    #[actix_web::test]
    async fn deleting_identities_tolerates_unknown_ids() {
        let (store, handle) = start_stub();
        let known = UserId::new(USER_ID).expect("fixture id");
        store.delete_identity(&known).await.expect("delete known");
        let unknown = UserId::random();
        store.delete_identity(&unknown).await.expect("delete unknown");
        handle.stop(true).await;
    }

    #[rstest]
    #[actix_web::test]
    async fn server_errors_are_unavailable() {
        let (store, handle) = start_stub();
        let err = store
            .sign_out(&SessionToken::new("remote-token"))
            .await
            .expect_err("logout fails");
        assert!(matches!(err, IdentityStoreError::Unavailable { .. }));
        handle.stop(true).await;
    }

    #[rstest]
    #[actix_web::test]
    async fn unreachable_service_is_unavailable() {
        let base = Url::parse("http://127.0.0.1:9/auth/v1").expect("url");
        let store = HttpIdentityStore::new(HttpIdentityConfig {
            base_url: base,
            api_key: "anon-key".to_owned(),
            timeout: Duration::from_millis(500),
        })
        .expect("client");
        let err = store
            .session(&SessionToken::new("remote-token"))
            .await
            .expect_err("no server");
        assert!(matches!(err, IdentityStoreError::Unavailable { .. }));
    }
}
