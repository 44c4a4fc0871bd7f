use std::sync::Arc;

use shelfwatch_core::store::RecordStore;

use crate::auth::revocation::RevokedSessions;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Record store client shared by every manager and handler.
    pub store: Arc<dyn RecordStore>,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Token ids signed out before their expiry.
    pub revoked: Arc<RevokedSessions>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            revoked: Arc::new(RevokedSessions::new()),
        }
    }
}
