//! WebSocket layer: connection loop and wire events.
//!
//! The endpoint at `/ws` carries matchmaking commands, signaling envelopes
//! and chat between a client and its partner.

pub mod connection;
pub mod handler;
pub mod messages;
