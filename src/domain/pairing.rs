//! Registry records: queued connections and active pairings.

use chrono::{DateTime, Utc};

use super::ConnectionId;

/// A connection with no partner that is searching for one.
///
/// Entries are kept in insertion order by the registry; `enqueued_at` is
/// informational and never used to re-sort the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingEntry {
    /// The waiting connection.
    pub connection_id: ConnectionId,
    /// When the connection joined the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl WaitingEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            enqueued_at: Utc::now(),
        }
    }
}

/// An active one-to-one session between two connections.
///
/// Stored once and referenced from both members through the registry's
/// membership index, so tearing it down cannot leave one direction behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    /// The connection whose enrollment completed the match. Creates the
    /// media offer.
    pub initiator: ConnectionId,
    /// The connection that was already waiting. Answers the offer.
    pub receiver: ConnectionId,
    /// When the pairing was created.
    pub paired_at: DateTime<Utc>,
}

impl Pairing {
    /// Creates a pairing stamped with the current time.
    #[must_use]
    pub fn new(initiator: ConnectionId, receiver: ConnectionId) -> Self {
        Self {
            initiator,
            receiver,
            paired_at: Utc::now(),
        }
    }

    /// Returns the member opposite `id`, or `None` if `id` is not a member.
    #[must_use]
    pub fn other(&self, id: ConnectionId) -> Option<ConnectionId> {
        if id == self.initiator {
            Some(self.receiver)
        } else if id == self.receiver {
            Some(self.initiator)
        } else {
            None
        }
    }

    /// Returns both members as `(initiator, receiver)`.
    #[must_use]
    pub const fn members(&self) -> (ConnectionId, ConnectionId) {
        (self.initiator, self.receiver)
    }
}
