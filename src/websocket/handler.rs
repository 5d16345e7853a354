use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::connection_manager::OutboundFrame;
use crate::metrics::{WS_CONNECTIONS_CLOSED, WS_CONNECTIONS_OPENED, WS_CONNECTION_DURATION};
use crate::server::AppState;

use super::protocol::InboundHandler;

const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket upgrade handler for `/websocket/{user_id}`
#[tracing::instrument(name = "ws.upgrade", skip(ws, state))]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    tracing::info!(user_id = %user_id, "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Handle an established WebSocket connection
#[tracing::instrument(name = "ws.connection", skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: AppState, user_id: String) {
    let connection_start = std::time::Instant::now();
    let ws_config = &state.settings.websocket;

    let (tx, mut rx) = mpsc::channel::<OutboundFrame>(ws_config.channel_buffer.max(1));
    let connection = state.connections.open(user_id.clone(), tx);
    let connection_id = connection.id;
    WS_CONNECTIONS_OPENED.inc();

    if let Err(e) = connection.send(ws_config.connected_ack.as_str()) {
        tracing::warn!(connection_id = %connection_id, error = %e, "Failed to send connect acknowledgment");
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Drains the outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.as_ref().into())).await {
                        tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket write failed");
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = ws_sender.close().await;
                    break;
                }
            }
        }
    });

    let mut inbound = InboundHandler::new(
        connection.clone(),
        state.connections.topics().clone(),
        ws_config.empty_message_notice.clone(),
    );
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(msg) => {
                    if !process_message(msg, &mut inbound) {
                        break;
                    }
                }
                // The stream ends on its own after a fatal transport error
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                }
            }
        }
        inbound.close();
    });

    let send_done = tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task completed");
            recv_task.abort();
            true
        }
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task completed");
            false
        }
    };

    state.connections.close(&connection);

    // Give the writer a moment to flush the close frame
    if !send_done && tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
        send_task.abort();
    }

    WS_CONNECTIONS_CLOSED.inc();
    let duration = connection_start.elapsed().as_secs_f64();
    WS_CONNECTION_DURATION.observe(duration);

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user_id,
        duration_secs = duration,
        "WebSocket connection closed"
    );
}

/// Process a received WebSocket message.
/// Returns false once the peer has closed.
fn process_message(msg: Message, inbound: &mut InboundHandler) -> bool {
    match msg {
        Message::Text(text) => {
            inbound.on_text(text.as_str());
            true
        }
        Message::Binary(_) => {
            tracing::debug!(connection_id = %inbound.connection().id, "Ignoring binary frame");
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %inbound.connection().id, "Received close frame");
            false
        }
    }
}
