//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_portal_state;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use portal::Trace;
#[cfg(debug_assertions)]
use portal::doc::ApiDoc;
use portal::inbound::http::configure_api;
use portal::inbound::http::health::{HealthState, live, ready};
use portal::inbound::http::state::HttpState;
use portal::inbound::ws;
use portal::inbound::ws::WsState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let api = web::scope("/api/v1")
        .wrap(session_middleware(key.clone(), cookie_secure, same_site))
        .configure(configure_api);
    let live_updates = web::scope("/ws")
        .wrap(session_middleware(key, cookie_secure, same_site))
        .service(ws::live_applications);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(Trace)
        .service(api)
        .service(live_updates)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Adapters are wired and the document catalogue seeded before binding; the
/// health state is marked ready once the listener is bound.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when wiring adapters, binding the socket, or
/// starting the server fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let state = build_portal_state(&config).await?;
    let http_state = web::Data::new(state.http);
    let ws_state = web::Data::new(state.ws);
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        ..
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
