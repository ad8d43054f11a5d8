//! stranger-relay server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stranger_relay::api;
use stranger_relay::app_state::AppState;
use stranger_relay::config::RelayConfig;
use stranger_relay::domain::PairingRegistry;
use stranger_relay::service::SessionRelay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, client_url = %config.client_url, "starting stranger-relay");

    // Build domain and service layers
    let registry = Arc::new(PairingRegistry::new());
    let relay = Arc::new(SessionRelay::new(registry, config.relay_settings()));

    // Build router
    let app = api::build_app(AppState::new(relay), &config.client_url);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
