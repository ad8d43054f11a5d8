//! Live matchmaking statistics.
//!
//! Every response is recomputed from the relay and registry at request
//! time; nothing is cached.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    ConnectionRole, ConnectionState, ConnectionStatusResponse, StatsResponse,
};
use crate::app_state::AppState;
use crate::domain::ConnectionId;
use crate::error::{ErrorResponse, RelayError};

/// `GET /stats` — Queue and session counters.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "Stats",
    summary = "Live statistics",
    description = "Connected clients, queue length and active sessions, read live.",
    responses(
        (status = 200, description = "Current counters", body = StatsResponse),
    )
)]
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.relay.stats();
    (StatusCode::OK, Json(StatsResponse::new(stats, Utc::now())))
}

/// `GET /stats/connections/{id}` — Matchmaking state of one connection.
///
/// # Errors
///
/// Returns [`RelayError::ConnectionNotFound`] if no live connection has
/// the given identifier.
#[utoipa::path(
    get,
    path = "/stats/connections/{id}",
    tag = "Stats",
    summary = "Connection status",
    params(
        ("id" = String, Path, description = "Connection identifier"),
    ),
    responses(
        (status = 200, description = "Connection state", body = ConnectionStatusResponse),
        (status = 404, description = "Unknown connection", body = ErrorResponse),
    )
)]
pub async fn connection_status_handler(
    State(state): State<AppState>,
    Path(id): Path<ConnectionId>,
) -> Result<impl IntoResponse, RelayError> {
    if !state.relay.is_connected(id) {
        return Err(RelayError::ConnectionNotFound(id));
    }

    let registry = state.relay.registry();
    let response = if let Some(pairing) = registry.pairing_of(id) {
        let role = if pairing.initiator == id {
            ConnectionRole::Initiator
        } else {
            ConnectionRole::Receiver
        };
        ConnectionStatusResponse {
            connection_id: id,
            state: ConnectionState::Paired,
            partner_id: pairing.other(id),
            role: Some(role),
            since: Some(pairing.paired_at),
        }
    } else if let Some(entry) = registry.waiting_entry(id) {
        ConnectionStatusResponse {
            connection_id: id,
            state: ConnectionState::Waiting,
            partner_id: None,
            role: None,
            since: Some(entry.enqueued_at),
        }
    } else {
        ConnectionStatusResponse {
            connection_id: id,
            state: ConnectionState::Idle,
            partner_id: None,
            role: None,
            since: None,
        }
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Statistics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/stats/connections/{id}", get(connection_status_handler))
}
