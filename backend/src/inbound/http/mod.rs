//! HTTP inbound adapter exposing the REST API.

use actix_web::web;

pub mod accounts;
pub mod applications;
pub mod auth;
pub mod document_types;
pub mod dto;
pub mod error;
pub mod health;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;

/// Register every `/api/v1` handler on a scope.
///
/// Literal application paths come before `/applications/{id}` so `stats`
/// and `track` are never read as ids.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::login)
        .service(accounts::register)
        .service(accounts::logout)
        .service(accounts::current_user)
        .service(accounts::update_current_user)
        .service(document_types::list_document_types)
        .service(applications::submit_application)
        .service(applications::list_applications)
        .service(applications::application_stats)
        .service(applications::track_application)
        .service(applications::get_application)
        .service(applications::process_application)
        .service(applications::cancel_application)
        .service(applications::complete_application);
}
