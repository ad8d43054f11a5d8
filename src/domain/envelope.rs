//! Transient relay payloads: signaling envelopes and chat messages.
//!
//! Neither is stored. They are built at the relay boundary with a
//! server-stamped sender and handed to the destination's send-channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConnectionId;

/// Kind of media-negotiation message carried by a [`SignalingEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    /// Session description offer.
    Offer,
    /// Session description answer.
    Answer,
    /// Trickled ICE candidate.
    IceCandidate,
}

impl SignalKind {
    /// Wire event name for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
        }
    }
}

/// A signaling message on its way from one connection to another.
///
/// `payload` is opaque: the relay never looks inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalingEnvelope {
    /// Sender, always taken from the connection the envelope arrived on.
    pub from: ConnectionId,
    /// Addressed recipient.
    pub to: ConnectionId,
    /// Negotiation step.
    pub kind: SignalKind,
    /// Opaque negotiation payload.
    pub payload: serde_json::Value,
}

/// Body of a relayed signaling event as the recipient sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayedSignal {
    /// Sender connection.
    pub from: ConnectionId,
    /// Opaque negotiation payload.
    pub payload: serde_json::Value,
}

impl From<SignalingEnvelope> for RelayedSignal {
    fn from(envelope: SignalingEnvelope) -> Self {
        Self {
            from: envelope.from,
            payload: envelope.payload,
        }
    }
}

/// A chat line relayed to the sender's current partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Sender connection.
    pub from: ConnectionId,
    /// Message text.
    pub text: String,
    /// Server receive time.
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message stamped with the current server time.
    #[must_use]
    pub fn new(from: ConnectionId, text: String) -> Self {
        Self {
            from,
            text,
            sent_at: Utc::now(),
        }
    }
}
