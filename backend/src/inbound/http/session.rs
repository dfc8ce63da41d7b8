//! Cookie session helpers so handlers never touch `actix_session` directly.
//!
//! The cookie carries the signed-in user id and the identity store token.
//! Handlers resolve the user on each request so role and activation changes
//! apply immediately.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, SessionToken, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const TOKEN_KEY: &str = "token";

/// Newtype over the Actix session exposing portal-level operations.
#[derive(Clone)]
pub struct SessionCookie(Session);

impl SessionCookie {
    /// Wrap the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record a successful sign-in.
    pub fn establish(&self, user_id: &UserId, token: &SessionToken) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .and_then(|()| self.0.insert(TOKEN_KEY, token.expose()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Signed-in user id, if the cookie carries a valid one.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| match UserId::new(&raw) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                None
            }
        }))
    }

    /// Identity store token for the current session.
    pub fn token(&self) -> Result<Option<SessionToken>, Error> {
        self.0
            .get::<String>(TOKEN_KEY)
            .map(|token| token.map(SessionToken::new))
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Require a user id or fail with `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop everything stored in the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionCookie {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionCookie::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    async fn set(session: SessionCookie) -> Result<HttpResponse, Error> {
        let id = UserId::new(USER).expect("fixture id");
        session.establish(&id, &SessionToken::new("token-1"))?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn get(session: SessionCookie) -> Result<HttpResponse, Error> {
        let id = session.require_user_id()?;
        let token = session.token()?.map(|t| t.expose().to_owned()).unwrap_or_default();
        Ok(HttpResponse::Ok().body(format!("{id}:{token}")))
    }

    async fn clear(session: SessionCookie) -> HttpResponse {
        session.clear();
        HttpResponse::Ok().finish()
    }

    async fn tamper(session: Session) -> HttpResponse {
        session
            .insert(USER_ID_KEY, "not-a-uuid")
            .expect("insert tampered id");
        HttpResponse::Ok().finish()
    }

    fn cookie_from(
        res: &actix_web::dev::ServiceResponse,
    ) -> actix_web::cookie::Cookie<'static> {
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    #[rstest]
    #[actix_web::test]
    async fn round_trips_user_and_token() {
        let app = test::init_service(
            App::new()
                .wrap(crate::inbound::http::test_utils::test_session_middleware())
                .route("/set", web::get().to(set))
                .route("/get", web::get().to(get)),
        )
        .await;
        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = cookie_from(&set_res);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, format!("{USER}:token-1"));
    }

    #[rstest]
    #[case::missing("/get")]
    #[case::tampered("/tamper")]
    #[actix_web::test]
    async fn missing_or_invalid_user_is_unauthorised(#[case] setup: &str) {
        let app = test::init_service(
            App::new()
                .wrap(crate::inbound::http::test_utils::test_session_middleware())
                .route("/tamper", web::get().to(tamper))
                .route("/get", web::get().to(get)),
        )
        .await;
        let first =
            test::call_service(&app, test::TestRequest::get().uri(setup).to_request()).await;
        let mut req = test::TestRequest::get().uri("/get");
        if let Some(cookie) = first
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
        {
            req = req.cookie(cookie.into_owned());
        }
        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn clearing_ends_the_session() {
        let app = test::init_service(
            App::new()
                .wrap(crate::inbound::http::test_utils::test_session_middleware())
                .route("/set", web::get().to(set))
                .route("/clear", web::get().to(clear))
                .route("/get", web::get().to(get)),
        )
        .await;
        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = cookie_from(&set_res);
        let cleared = test::call_service(
            &app,
            test::TestRequest::get().uri("/clear").cookie(cookie).to_request(),
        )
        .await;
        let removal = cookie_from(&cleared);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(removal).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
