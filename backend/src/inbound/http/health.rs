//! Liveness and readiness probes.
//!
//! Readiness also checks out a database connection when the portal runs on
//! PostgreSQL, so a lost database takes the instance out of rotation.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use tracing::warn;

use crate::outbound::persistence::DbPool;

/// Probe state shared with the server.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    database: Option<DbPool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            database: None,
        }
    }
}

impl HealthState {
    /// Not ready, live, and without a database dependency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include a database checkout in readiness.
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.database = Some(pool);
        self
    }

    /// Start accepting traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so orchestrators drain the instance.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Whether start-up has finished.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Whether the process still reports itself alive.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn database_reachable(&self) -> bool {
        let Some(pool) = &self.database else {
            return true;
        };
        match pool.get().await {
            Ok(_) => true,
            Err(error) => {
                warn!(%error, "readiness database check failed");
                false
            }
        }
    }
}

fn probe_response(probe_ok: bool) -> HttpResponse {
    let mut response = if probe_ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// Readiness probe: `200` once started and the database answers.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Ready for traffic"),
        (status = 503, description = "Starting up or database unreachable")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_ready() && state.database_reachable().await)
}

/// Liveness probe: `503` once the instance is draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Alive"),
        (status = 503, description = "Shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_alive())
}
