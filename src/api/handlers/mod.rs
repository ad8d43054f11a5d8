//! REST endpoint handlers.

pub mod stats;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all REST routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(system::routes()).merge(stats::routes())
}
