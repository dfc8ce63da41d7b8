//! Portal entry-point: loads configuration, prepares the database, and serves
//! the REST API, the live application socket, and the OpenAPI docs.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use portal::inbound::http::health::HealthState;
use portal::inbound::http::session_config::{BuildMode, session_settings_from_env};
use portal::inbound::ws::OriginAllowList;
use portal::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use portal::settings::PortalSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = PortalSettings::load().wrap_err("loading portal settings")?;
    let mode = BuildMode::from_debug_assertions();
    let session = session_settings_from_env(&DefaultEnv::new(), mode)
        .wrap_err("loading session settings")?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let bind_addr = settings.bind_addr()?;
    let allowed_origins = allowed_origins(&settings, mode)?;
    let mut config = ServerConfig::new(session, bind_addr)
        .with_identity(settings.identity_endpoint()?)
        .with_allowed_origins(allowed_origins)
        .with_seed_document_types(settings.seed_document_types);

    let mut health = HealthState::new();
    if let Some(database_url) = settings.database_url() {
        if settings.run_migrations {
            run_pending_migrations(database_url)
                .await
                .wrap_err("applying migrations")?;
        }
        let pool = DbPool::new(PoolConfig::new(database_url))
            .await
            .wrap_err("connecting to PostgreSQL")?;
        health = health.with_database(pool.clone());
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(health);
    info!(%bind_addr, "starting portal");
    let server = create_server(health_state, config).await?;
    server.await?;
    Ok(())
}

fn allowed_origins(settings: &PortalSettings, mode: BuildMode) -> color_eyre::Result<OriginAllowList> {
    match settings.allowed_origins() {
        Some(entries) => Ok(OriginAllowList::parse(entries)?),
        None if mode == BuildMode::Debug => Ok(OriginAllowList::development()),
        None => Err(eyre!(
            "PORTAL_ALLOWED_ORIGINS must list the WebSocket origins in release builds"
        )),
    }
}
