//! WebSocket adapter pushing application changes to signed-in clients.
//!
//! Upgrades are accepted only from allow-listed origins and only for an
//! active session user. Each connection then receives the inserts and
//! updates its user may see.

use actix_web::http::header::ORIGIN;
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::error;

use crate::inbound::http::auth::authorize;
use crate::inbound::http::session::SessionCookie;

mod session;

pub mod messages;
pub mod origin;
pub mod state;

pub use origin::{OriginAllowList, OriginPatternError, OriginRejection};
pub use state::WsState;

/// Upgrade to the live application feed; mounted under `/ws`.
#[get("/applications")]
pub async fn live_applications(
    state: web::Data<WsState>,
    session: SessionCookie,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origins = req.headers().get_all(ORIGIN);
    let origin = origins.next();
    if origins.next().is_some() {
        error!("multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    state.allowed_origins.check(origin).map_err(|rejection| match rejection {
        OriginRejection::NotAllowed => actix_web::error::ErrorForbidden("Origin not allowed"),
        OriginRejection::Malformed => actix_web::error::ErrorBadRequest("Invalid Origin header"),
    })?;

    let user = authorize(state.accounts.as_ref(), &session, None).await?;
    let subscription = state.changes.subscribe();
    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(%error, "WebSocket upgrade failed");
        error
    })?;
    actix_web::rt::spawn(session::LiveSession::new(user, subscription).run(ws_session, messages));
    Ok(response)
}
