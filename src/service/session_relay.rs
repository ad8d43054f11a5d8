//! Session relay: bridges live connections to the pairing registry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::domain::{
    ChatMessage, ConnectionId, MatchOutcome, PairingRegistry, RegistryCounts, RegistryTxn,
    SignalKind, SignalingEnvelope,
};
use crate::error::RelayError;
use crate::ws::messages::{ChatRequest, ClientEvent, ServerEvent, SignalingRequest};

/// Send half of a connection's outbound queue.
pub type Outbound = mpsc::UnboundedSender<ServerEvent>;

/// Behaviour knobs for [`SessionRelay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    /// Reject signaling envelopes not addressed to the sender's partner.
    pub enforce_partner: bool,
    /// Maximum chat message length in characters.
    pub chat_max_len: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            enforce_partner: true,
            chat_max_len: crate::config::DEFAULT_CHAT_MAX_LEN,
        }
    }
}

/// Live statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Connections registered with the relay.
    pub total_connected: usize,
    /// Registry counters.
    pub registry: RegistryCounts,
}

/// Routes connection events through the registry and on to partners.
///
/// Holds the [`PairingRegistry`] handle and a table of per-connection
/// outbound channels. Sends never block, so notifications are dispatched
/// while the registry transaction that produced them is still held: a
/// teardown is fully applied before the partner hears about it, and the
/// two halves of a match go out before any other mutation can touch
/// either participant.
#[derive(Debug)]
pub struct SessionRelay {
    registry: Arc<PairingRegistry>,
    channels: DashMap<ConnectionId, Outbound>,
    settings: RelaySettings,
}

impl SessionRelay {
    /// Creates a relay over the given registry.
    #[must_use]
    pub fn new(registry: Arc<PairingRegistry>, settings: RelaySettings) -> Self {
        Self {
            registry,
            channels: DashMap::new(),
            settings,
        }
    }

    /// Returns a reference to the inner [`PairingRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PairingRegistry> {
        &self.registry
    }

    /// Returns `true` if `id` has a registered send-channel.
    #[must_use]
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.channels.contains_key(&id)
    }

    /// Number of registered connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.channels.len()
    }

    /// Live statistics, recomputed on every call.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            total_connected: self.connection_count(),
            registry: self.registry.counts(),
        }
    }

    /// Registers a new connection and tells it its identifier.
    pub fn on_connect(&self, id: ConnectionId, outbound: Outbound) {
        self.channels.insert(id, outbound);
        self.send(id, ServerEvent::Connected { connection_id: id });
        tracing::info!(connection_id = %id, "connection registered");
    }

    /// Parses a raw text frame and dispatches it.
    ///
    /// Rejections are reported to `id` only.
    pub fn handle_frame(&self, id: ConnectionId, text: &str) {
        let result = serde_json::from_str::<ClientEvent>(text)
            .map_err(RelayError::from)
            .and_then(|event| self.dispatch(id, event));
        if let Err(err) = result {
            self.report(id, &err);
        }
    }

    /// Dispatches one parsed client event.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError`] when a signaling or chat payload is
    /// rejected. Registry state is unaffected in that case.
    pub fn dispatch(&self, id: ConnectionId, event: ClientEvent) -> Result<(), RelayError> {
        match event {
            ClientEvent::FindMatch => self.on_find_match(id),
            ClientEvent::StopMatch => self.on_stop_match(id),
            ClientEvent::Skip => self.on_skip(id),
            ClientEvent::Offer(req) => self.on_signal(id, SignalKind::Offer, req)?,
            ClientEvent::Answer(req) => self.on_signal(id, SignalKind::Answer, req)?,
            ClientEvent::IceCandidate(req) => self.on_signal(id, SignalKind::IceCandidate, req)?,
            ClientEvent::ChatMessage(req) => self.on_chat(id, req)?,
        }
        Ok(())
    }

    /// `find-match`: enroll and notify the outcome.
    ///
    /// A caller that is still paired leaves its old pairing first; the
    /// abandoned partner is told and left idle.
    pub fn on_find_match(&self, id: ConnectionId) {
        let mut txn = self.registry.transaction();
        if let Some(former) = txn.disband(id) {
            tracing::info!(connection_id = %id, partner_id = %former, "re-search abandons pairing");
            self.send(former, ServerEvent::PartnerDisconnected);
        }
        self.enroll_and_notify(&mut txn, id);
    }

    /// `stop-match`: leave the waiting queue.
    ///
    /// Ignored once the caller has been paired.
    pub fn on_stop_match(&self, id: ConnectionId) {
        let mut txn = self.registry.transaction();
        if !txn.is_waiting(id) {
            tracing::debug!(connection_id = %id, "stop-match ignored, not waiting");
            return;
        }
        let _ = txn.disband(id);
        self.send(id, ServerEvent::SearchStopped);
        tracing::info!(connection_id = %id, "search stopped");
    }

    /// `skip`: end the pairing and put both sides back in the queue.
    ///
    /// The skipper is re-enrolled first, so a connection already waiting
    /// is offered to it before the skipped partner. With nobody else
    /// waiting this pairs the two straight back together, skipper as
    /// receiver; the partner gets `partner-disconnected` followed by a new
    /// `match-found` and never sees `waiting`. That is the intended outcome.
    pub fn on_skip(&self, id: ConnectionId) {
        let mut txn = self.registry.transaction();
        let former = txn.disband(id);
        if let Some(partner) = former {
            tracing::info!(connection_id = %id, partner_id = %partner, "pairing skipped");
            self.send(partner, ServerEvent::PartnerDisconnected);
        }
        self.enroll_and_notify(&mut txn, id);
        if let Some(partner) = former {
            self.enroll_and_notify(&mut txn, partner);
        }
    }

    /// Transport closed: tear down and deregister.
    ///
    /// The partner is told but stays idle.
    pub fn on_disconnect(&self, id: ConnectionId) {
        {
            let mut txn = self.registry.transaction();
            if let Some(partner) = txn.disband(id) {
                self.send(partner, ServerEvent::PartnerDisconnected);
                tracing::info!(connection_id = %id, partner_id = %partner, "pairing ended by disconnect");
            }
        }
        self.channels.remove(&id);
        tracing::info!(connection_id = %id, "connection closed");
    }

    /// Relays a signaling envelope to its addressee with `from` stamped.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingRecipient`] when `to` is absent,
    /// [`RelayError::MissingPayload`] when there is nothing to relay, and
    /// [`RelayError::NotPartner`] when partner checking is on and the
    /// sender is paired with someone else.
    pub fn on_signal(
        &self,
        from: ConnectionId,
        kind: SignalKind,
        req: SignalingRequest,
    ) -> Result<(), RelayError> {
        let to = req.to.ok_or(RelayError::MissingRecipient)?;
        let payload = req.into_payload().ok_or(RelayError::MissingPayload)?;

        if self.settings.enforce_partner {
            match self.registry.partner_of(from) {
                Some(partner) if partner == to => {}
                Some(_) => return Err(RelayError::NotPartner(to)),
                None => {
                    tracing::debug!(connection_id = %from, to = %to, kind = kind.as_str(), "sender unpaired, signal dropped");
                    return Ok(());
                }
            }
        }

        let envelope = SignalingEnvelope {
            from,
            to,
            kind,
            payload,
        };
        if self.send(to, envelope.into()) {
            tracing::debug!(connection_id = %from, to = %to, kind = kind.as_str(), "signal relayed");
        }
        Ok(())
    }

    /// Relays a chat line to the sender's current partner.
    ///
    /// Silently dropped when the sender has no partner.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ChatTooLong`] when the text exceeds the
    /// configured maximum.
    pub fn on_chat(&self, from: ConnectionId, req: ChatRequest) -> Result<(), RelayError> {
        let max = self.settings.chat_max_len;
        if req.text.chars().count() > max {
            return Err(RelayError::ChatTooLong { max });
        }

        let Some(partner) = self.registry.partner_of(from) else {
            tracing::debug!(connection_id = %from, "chat from unpaired connection dropped");
            return Ok(());
        };
        self.send(partner, ServerEvent::ChatMessage(ChatMessage::new(from, req.text)));
        Ok(())
    }

    fn enroll_and_notify(&self, txn: &mut RegistryTxn<'_>, id: ConnectionId) {
        match txn.enroll(id) {
            MatchOutcome::Waiting => {
                tracing::debug!(connection_id = %id, "waiting for partner");
                self.send(id, ServerEvent::Waiting);
            }
            MatchOutcome::PairedWith(partner) => {
                tracing::info!(initiator = %id, receiver = %partner, "match created");
                self.send(
                    id,
                    ServerEvent::MatchFound {
                        partner_id: partner,
                        should_initiate: true,
                    },
                );
                self.send(
                    partner,
                    ServerEvent::MatchFound {
                        partner_id: id,
                        should_initiate: false,
                    },
                );
            }
        }
    }

    fn report(&self, id: ConnectionId, err: &RelayError) {
        tracing::warn!(connection_id = %id, code = err.error_code(), error = %err, "frame rejected");
        self.send(id, err.to_event());
    }

    /// Queues `event` for `to`. Returns `false` on a routing miss.
    fn send(&self, to: ConnectionId, event: ServerEvent) -> bool {
        let Some(channel) = self.channels.get(&to) else {
            tracing::debug!(to = %to, event = event.name(), "routing miss, no live channel");
            return false;
        };
        if channel.send(event).is_err() {
            tracing::debug!(to = %to, "routing miss, channel closed");
            return false;
        }
        true
    }
}
