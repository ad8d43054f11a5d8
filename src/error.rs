//! Relay error types with wire and HTTP mapping.
//!
//! [`RelayError`] is the central error type. Errors raised while handling a
//! WebSocket frame are reported back to the offending connection as an
//! `error` event; errors raised by HTTP handlers become a structured JSON
//! response. Neither path touches registry state.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;
use crate::ws::messages::ServerEvent;

/// Structured JSON error response body.
///
/// All HTTP error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "connection not found: 6f1c..."
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | Routing/State   | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Frame was not a recognised JSON event.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Signaling envelope without a `to` field.
    #[error("signaling message is missing the `to` recipient")]
    MissingRecipient,

    /// Signaling envelope with no negotiation data to relay.
    #[error("signaling message carries no payload")]
    MissingPayload,

    /// Chat text exceeded the configured maximum.
    #[error("chat message exceeds {max} characters")]
    ChatTooLong {
        /// Configured maximum length in characters.
        max: usize,
    },

    /// Signaling envelope addressed to someone other than the partner.
    #[error("connection {0} is not your partner")]
    NotPartner(ConnectionId),

    /// No live connection with the given identifier.
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedMessage(_) => 1001,
            Self::MissingRecipient => 1002,
            Self::ChatTooLong { .. } => 1003,
            Self::MissingPayload => 1004,
            Self::NotPartner(_) => 2001,
            Self::ConnectionNotFound(_) => 2002,
            Self::Internal(_) => 3000,
            Self::InvalidConfig(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedMessage(_)
            | Self::MissingRecipient
            | Self::MissingPayload
            | Self::ChatTooLong { .. } => StatusCode::BAD_REQUEST,
            Self::NotPartner(_) => StatusCode::CONFLICT,
            Self::ConnectionNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidConfig(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the `error` event reported to the offending connection.
    #[must_use]
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::Error {
            code: self.error_code(),
            message: self.to_string(),
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
