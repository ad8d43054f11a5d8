//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Optional settings that are missing or
//! unparsable fall back to their defaults.

use std::net::SocketAddr;

use crate::error::RelayError;
use crate::service::RelaySettings;

/// Default bind address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Default allowed CORS origin.
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";

/// Default maximum chat message length, in characters.
pub const DEFAULT_CHAT_MAX_LEN: usize = 2000;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Origin allowed by CORS. `*` allows any origin.
    pub client_url: String,

    /// Drop signaling envelopes not addressed to the sender's partner.
    pub enforce_partner: bool,

    /// Maximum chat message length in characters.
    pub chat_max_len: usize,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl RelayConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if `LISTEN_ADDR` or `PORT` is
    /// set but cannot be parsed.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if `LISTEN_ADDR` or `PORT` is
    /// set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = match (lookup("LISTEN_ADDR"), lookup("PORT")) {
            (Some(addr), _) => addr
                .parse()
                .map_err(|_| RelayError::InvalidConfig(format!("LISTEN_ADDR={addr}")))?,
            (None, Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| RelayError::InvalidConfig(format!("PORT={port}")))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => DEFAULT_LISTEN_ADDR
                .parse()
                .map_err(|_| RelayError::Internal("bad default listen address".to_string()))?,
        };

        let client_url = lookup("CLIENT_URL").unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string());
        let enforce_partner = parse_bool(lookup("RELAY_ENFORCE_PARTNER").as_deref(), true);
        let chat_max_len = parse_or(lookup("CHAT_MAX_LEN"), DEFAULT_CHAT_MAX_LEN);
        let log_json = lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            listen_addr,
            client_url,
            enforce_partner,
            chat_max_len,
            log_json,
        })
    }

    /// Relay behaviour knobs derived from this configuration.
    #[must_use]
    pub const fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            enforce_partner: self.enforce_partner,
            chat_max_len: self.chat_max_len,
        }
    }
}

/// Parses `value` as `T`, returning `default` on missing or invalid values.
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Parses a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
