//! Statistics and connection-status DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;
use crate::service::RelayStats;

/// Response body for `GET /stats`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Live WebSocket connections.
    pub total_connected: usize,
    /// Connections waiting for a partner.
    pub users_in_queue: usize,
    /// Active one-to-one sessions.
    pub active_chats: usize,
    /// Connections either waiting or in a session.
    pub total_active_users: usize,
    /// RFC 3339 server time the counters were read at.
    pub timestamp: String,
}

impl StatsResponse {
    /// Builds the response from a relay snapshot taken at `now`.
    #[must_use]
    pub fn new(stats: RelayStats, now: DateTime<Utc>) -> Self {
        let users_in_queue = stats.registry.waiting;
        let active_chats = stats.registry.active_sessions;
        Self {
            total_connected: stats.total_connected,
            users_in_queue,
            active_chats,
            total_active_users: users_in_queue.saturating_add(active_chats.saturating_mul(2)),
            timestamp: now.to_rfc3339(),
        }
    }
}

/// Matchmaking state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Connected but neither waiting nor paired.
    Idle,
    /// In the waiting queue.
    Waiting,
    /// In an active session.
    Paired,
}

/// Role within an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    /// Creates the media offer.
    Initiator,
    /// Answers the offer.
    Receiver,
}

/// Response body for `GET /stats/connections/{id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    /// The queried connection.
    #[schema(value_type = String)]
    pub connection_id: ConnectionId,
    /// Current matchmaking state.
    pub state: ConnectionState,
    /// Partner, when paired.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub partner_id: Option<ConnectionId>,
    /// Role, when paired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ConnectionRole>,
    /// When the connection entered its current state (queue or session).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}
