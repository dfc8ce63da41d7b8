//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountCommand, ApplicationCommand, ApplicationQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Sign-in, registration and profile use-cases.
    pub accounts: Arc<dyn AccountCommand>,
    /// Application mutations.
    pub applications: Arc<dyn ApplicationCommand>,
    /// Application reads and the document catalogue.
    pub applications_query: Arc<dyn ApplicationQuery>,
}

impl HttpState {
    /// Bundle the driving ports.
    pub fn new(
        accounts: Arc<dyn AccountCommand>,
        applications: Arc<dyn ApplicationCommand>,
        applications_query: Arc<dyn ApplicationQuery>,
    ) -> Self {
        Self {
            accounts,
            applications,
            applications_query,
        }
    }
}
