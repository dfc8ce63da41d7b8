//! Wire payloads pushed to live-update clients.

use serde::Serialize;

use crate::domain::ApplicationChange;
use crate::inbound::http::dto::ApplicationResponse;

/// One application change, as sent over the socket.
///
/// ```json
/// {"type":"application.updated","application":{"id":"…","status":"approved",…}}
/// ```
#[derive(Debug, Serialize)]
pub struct ApplicationEventMessage {
    /// `application.inserted` or `application.updated`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Snapshot after the change.
    pub application: ApplicationResponse,
}

impl From<&ApplicationChange> for ApplicationEventMessage {
    fn from(change: &ApplicationChange) -> Self {
        Self {
            kind: format!("application.{}", change.kind.as_str()),
            application: ApplicationResponse::from(&change.application),
        }
    }
}
