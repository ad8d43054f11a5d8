//! Domain layer: connection identity, the pairing registry, and the
//! transient payloads relayed between partners.
//!
//! Nothing in here knows about WebSockets or HTTP.

pub mod connection_id;
pub mod envelope;
pub mod pairing;
pub mod pairing_registry;

pub use connection_id::ConnectionId;
pub use envelope::{ChatMessage, RelayedSignal, SignalKind, SignalingEnvelope};
pub use pairing::{Pairing, WaitingEntry};
pub use pairing_registry::{MatchOutcome, PairingRegistry, RegistryCounts, RegistryTxn};
