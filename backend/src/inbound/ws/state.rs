//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::ports::{AccountCommand, ApplicationChangeFeed};

use super::origin::OriginAllowList;

/// Dependencies of the live-update endpoint.
#[derive(Clone)]
pub struct WsState {
    /// Resolves the session user on upgrade.
    pub accounts: Arc<dyn AccountCommand>,
    /// Source of application changes.
    pub changes: Arc<dyn ApplicationChangeFeed>,
    /// Origins allowed to connect.
    pub allowed_origins: Arc<OriginAllowList>,
}

impl WsState {
    /// Bundle the ports and the allow-list.
    pub fn new(
        accounts: Arc<dyn AccountCommand>,
        changes: Arc<dyn ApplicationChangeFeed>,
        allowed_origins: OriginAllowList,
    ) -> Self {
        Self {
            accounts,
            changes,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
