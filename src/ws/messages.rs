//! WebSocket wire events.
//!
//! Every frame is a JSON text message `{ "event": "<name>", "data": ... }`.
//! `data` is absent for events that carry no payload, and ignored if a
//! client sends one anyway.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, ConnectionId, RelayedSignal, SignalKind, SignalingEnvelope};

/// Events a client can send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawClientFrame")]
pub enum ClientEvent {
    /// Join the waiting queue, or get paired immediately.
    FindMatch,
    /// Leave the waiting queue.
    StopMatch,
    /// End the current pairing and search again.
    Skip,
    /// Relay a session description offer.
    Offer(SignalingRequest),
    /// Relay a session description answer.
    Answer(SignalingRequest),
    /// Relay an ICE candidate.
    IceCandidate(SignalingRequest),
    /// Send a chat line to the current partner.
    ChatMessage(ChatRequest),
}

/// Frame as it arrives, before the event name is resolved.
#[derive(Debug, Deserialize)]
struct RawClientFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl TryFrom<RawClientFrame> for ClientEvent {
    type Error = String;

    fn try_from(frame: RawClientFrame) -> Result<Self, Self::Error> {
        fn body<T: serde::de::DeserializeOwned>(data: serde_json::Value) -> Result<T, String> {
            serde_json::from_value(data).map_err(|err| err.to_string())
        }

        match frame.event.as_str() {
            "find-match" => Ok(Self::FindMatch),
            "stop-match" => Ok(Self::StopMatch),
            "skip" => Ok(Self::Skip),
            "offer" => body(frame.data).map(Self::Offer),
            "answer" => body(frame.data).map(Self::Answer),
            "ice-candidate" => body(frame.data).map(Self::IceCandidate),
            "chat-message" => body(frame.data).map(Self::ChatMessage),
            other => Err(format!("unknown event `{other}`")),
        }
    }
}

/// Signaling payload as sent by a client.
///
/// The negotiation data is either carried in `payload`, or spread over the
/// remaining fields (`{ to, offer, type }` and the like), in which case
/// those fields are relayed together as one object. A client-supplied
/// `from` is never relayed; the relay stamps the real sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalingRequest {
    /// Recipient. Missing values are rejected by the relay.
    #[serde(default)]
    pub to: Option<ConnectionId>,
    /// Opaque negotiation payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Any other fields of the request.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SignalingRequest {
    /// Builds a request carrying an explicit `payload`.
    #[must_use]
    pub fn new(to: ConnectionId, payload: serde_json::Value) -> Self {
        Self {
            to: Some(to),
            payload: Some(payload),
            extra: serde_json::Map::new(),
        }
    }

    /// Extracts the payload to relay.
    ///
    /// Returns `payload` when present, otherwise the remaining fields
    /// (without `from`) as an object, or `None` when there is nothing to
    /// relay.
    #[must_use]
    pub fn into_payload(self) -> Option<serde_json::Value> {
        if let Some(payload) = self.payload {
            return Some(payload);
        }
        let mut extra = self.extra;
        extra.remove("from");
        if extra.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(extra))
        }
    }
}

/// Chat payload as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Message text.
    #[serde(alias = "message")]
    pub text: String,
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// First frame on every socket: the identifier peers address it by.
    #[serde(rename_all = "camelCase")]
    Connected {
        /// This connection's identifier.
        connection_id: ConnectionId,
    },
    /// Enrolled with no partner available yet.
    Waiting,
    /// `stop-match` removed the connection from the queue.
    SearchStopped,
    /// Paired with another connection.
    #[serde(rename_all = "camelCase")]
    MatchFound {
        /// The partner's identifier.
        partner_id: ConnectionId,
        /// `true` for the side that must create the media offer.
        should_initiate: bool,
    },
    /// The partner skipped or disconnected.
    PartnerDisconnected,
    /// Relayed offer.
    Offer(RelayedSignal),
    /// Relayed answer.
    Answer(RelayedSignal),
    /// Relayed ICE candidate.
    IceCandidate(RelayedSignal),
    /// Relayed chat line.
    ChatMessage(ChatMessage),
    /// A frame from this connection was rejected.
    Error {
        /// Numeric error code.
        code: u32,
        /// Human-readable message.
        message: String,
    },
}

impl ServerEvent {
    /// Wire event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Waiting => "waiting",
            Self::SearchStopped => "search-stopped",
            Self::MatchFound { .. } => "match-found",
            Self::PartnerDisconnected => "partner-disconnected",
            Self::Offer(_) => SignalKind::Offer.as_str(),
            Self::Answer(_) => SignalKind::Answer.as_str(),
            Self::IceCandidate(_) => SignalKind::IceCandidate.as_str(),
            Self::ChatMessage(_) => "chat-message",
            Self::Error { .. } => "error",
        }
    }
}

impl From<SignalingEnvelope> for ServerEvent {
    fn from(envelope: SignalingEnvelope) -> Self {
        match envelope.kind {
            SignalKind::Offer => Self::Offer(envelope.into()),
            SignalKind::Answer => Self::Answer(envelope.into()),
            SignalKind::IceCandidate => Self::IceCandidate(envelope.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_payloadless_commands() {
        let Ok(event) = serde_json::from_str::<ClientEvent>(r#"{"event":"find-match"}"#) else {
            panic!("find-match should parse");
        };
        assert_eq!(event, ClientEvent::FindMatch);

        let Ok(event) = serde_json::from_str::<ClientEvent>(r#"{"event":"stop-match"}"#) else {
            panic!("stop-match should parse");
        };
        assert_eq!(event, ClientEvent::StopMatch);
    }

    #[test]
    fn payloadless_commands_ignore_data() {
        for raw in [
            r#"{"event":"find-match","data":{}}"#,
            r#"{"event":"find-match","data":null}"#,
        ] {
            let Ok(event) = serde_json::from_str::<ClientEvent>(raw) else {
                panic!("{raw} should parse");
            };
            assert_eq!(event, ClientEvent::FindMatch);
        }
        let Ok(event) = serde_json::from_str::<ClientEvent>(r#"{"event":"skip","data":{}}"#) else {
            panic!("skip with empty data should parse");
        };
        assert_eq!(event, ClientEvent::Skip);
    }

    #[test]
    fn parses_signaling_and_ignores_client_from() {
        let to = ConnectionId::new();
        let raw = format!(
            r#"{{"event":"ice-candidate","data":{{"to":"{to}","from":"spoofed","payload":{{"candidate":"c"}}}}}}"#
        );
        let Ok(ClientEvent::IceCandidate(req)) = serde_json::from_str::<ClientEvent>(&raw) else {
            panic!("ice-candidate should parse");
        };
        assert_eq!(req.to, Some(to));
        assert_eq!(req.into_payload(), Some(serde_json::json!({ "candidate": "c" })));
    }

    #[test]
    fn spread_fields_become_the_payload() {
        let to = ConnectionId::new();
        let raw = format!(
            r#"{{"event":"offer","data":{{"to":"{to}","from":"spoofed","type":"offer","offer":{{"sdp":"v=0"}}}}}}"#
        );
        let Ok(ClientEvent::Offer(req)) = serde_json::from_str::<ClientEvent>(&raw) else {
            panic!("offer should parse");
        };
        assert_eq!(req.to, Some(to));
        assert_eq!(
            req.into_payload(),
            Some(serde_json::json!({ "type": "offer", "offer": { "sdp": "v=0" } }))
        );
    }

    #[test]
    fn request_without_negotiation_data_has_no_payload() {
        let to = ConnectionId::new();
        let raw = format!(r#"{{"event":"answer","data":{{"to":"{to}","from":"x"}}}}"#);
        let Ok(ClientEvent::Answer(req)) = serde_json::from_str::<ClientEvent>(&raw) else {
            panic!("answer should parse");
        };
        assert_eq!(req.into_payload(), None);
    }

    #[test]
    fn signaling_without_recipient_still_parses() {
        let raw = r#"{"event":"offer","data":{"payload":{}}}"#;
        let Ok(ClientEvent::Offer(req)) = serde_json::from_str::<ClientEvent>(raw) else {
            panic!("offer should parse");
        };
        assert_eq!(req.to, None);
    }

    #[test]
    fn chat_accepts_message_alias() {
        let raw = r#"{"event":"chat-message","data":{"message":"hello"}}"#;
        let Ok(ClientEvent::ChatMessage(req)) = serde_json::from_str::<ClientEvent>(raw) else {
            panic!("chat-message should parse");
        };
        assert_eq!(req.text, "hello");
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"teleport"}"#).is_err());
    }

    #[test]
    fn match_found_wire_shape() {
        let partner = ConnectionId::new();
        let event = ServerEvent::MatchFound {
            partner_id: partner,
            should_initiate: true,
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "match-found",
                "data": { "partnerId": partner.to_string(), "shouldInitiate": true }
            })
        );
        assert_eq!(event.name(), "match-found");
    }

    #[test]
    fn unit_events_have_no_data() {
        let json = serde_json::to_value(ServerEvent::PartnerDisconnected).unwrap_or_default();
        assert_eq!(json, serde_json::json!({ "event": "partner-disconnected" }));
    }

    #[test]
    fn envelope_maps_to_matching_event() {
        let from = ConnectionId::new();
        let envelope = SignalingEnvelope {
            from,
            to: ConnectionId::new(),
            kind: SignalKind::Answer,
            payload: serde_json::json!({ "sdp": "v=0" }),
        };
        let ServerEvent::Answer(signal) = ServerEvent::from(envelope) else {
            panic!("expected answer");
        };
        assert_eq!(signal.from, from);
    }
}
