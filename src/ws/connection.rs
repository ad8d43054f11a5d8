//! Per-connection WebSocket loop.
//!
//! Reads client frames and hands them to the [`SessionRelay`], and writes
//! events queued for this connection back to the socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::ConnectionId;
use crate::service::SessionRelay;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Mints the connection's identifier and registers its outbound queue.
/// - Dispatches incoming text frames through the relay.
/// - Forwards queued [`crate::ws::messages::ServerEvent`]s to the client.
///
/// The relay's disconnect handling runs exactly once, after the loop ends.
pub async fn run_connection(socket: WebSocket, relay: Arc<SessionRelay>) {
    let connection_id = ConnectionId::new();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    relay.on_connect(connection_id, outbound_tx);

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => relay.handle_frame(connection_id, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Event queued by the relay
            event = outbound_rx.recv() => {
                let Some(event) = event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(%connection_id, error = %err, "failed to encode event");
                        continue;
                    }
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    break;
                }
            }
        }
    }

    relay.on_disconnect(connection_id);
    tracing::debug!(%connection_id, "ws connection closed");
}
