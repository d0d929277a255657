use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use corral_domain::{DeliveryError, SubscriberSession};

use crate::state::AppState;

/// Hub-facing half of one WebSocket connection.
///
/// `deliver` only enqueues; the send task owns the socket sink and drains
/// the queue, so a slow client never stalls the broadcast fan-out.
struct WsSession {
    tx: mpsc::UnboundedSender<String>,
}

impl SubscriberSession for WsSession {
    fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        self.tx
            .send(message.to_string())
            .map_err(|_| DeliveryError::ChannelClosed)
    }
}

/// Upgrade handler for the live telemetry stream.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let session_id = state.hub.connect(Arc::new(WsSession { tx })).await;
    debug!(session_id, "WebSocket subscriber connected");

    // Drain queued broadcasts into the socket until either side goes away.
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(Message::Text(message)).await.is_err() {
                break;
            }
        }
    });

    // The stream is one-way; inbound frames only matter for detecting close.
    while let Some(Ok(message)) = receiver.next().await {
        if let Message::Close(_) = message {
            break;
        }
    }

    state.hub.disconnect(session_id).await;
    send_task.abort();
    debug!(session_id, "WebSocket subscriber disconnected");
}
