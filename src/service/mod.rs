//! Service layer: connection event handling and message routing.
//!
//! [`SessionRelay`] drives matchmaking through the
//! [`super::domain::PairingRegistry`] and forwards payloads between paired
//! connections.

pub mod session_relay;

pub use session_relay::{Outbound, RelaySettings, RelayStats, SessionRelay};
