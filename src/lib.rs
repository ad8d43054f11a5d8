//! # stranger-relay
//!
//! Matchmaking and signaling relay for anonymous one-to-one video chat.
//!
//! Clients connect over WebSocket, ask for a match, and are paired with the
//! longest-waiting stranger. Once paired, the relay forwards the opaque
//! offer/answer/ICE messages and chat lines between the two sides so they
//! can set up a direct media channel. All state is in memory and is lost
//! on restart.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler (ws/)
//!     ├── REST Handlers (api/)
//!     │
//!     ├── SessionRelay (service/)
//!     │
//!     └── PairingRegistry (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
