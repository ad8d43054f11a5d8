//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::SessionRelay;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay owning the connection table and the registry handle.
    pub relay: Arc<SessionRelay>,
}

impl AppState {
    /// Wraps a relay for use as router state.
    #[must_use]
    pub fn new(relay: Arc<SessionRelay>) -> Self {
        Self { relay }
    }
}
