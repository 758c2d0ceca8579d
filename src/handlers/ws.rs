//! # Realtime Channel
//!
//! The `/ws` endpoint. Each socket gets a hub registration; a writer task
//! drains the hub's frame stream while the read loop handles room
//! membership and technician position relays. No auth handshake: the
//! channel only ever carries data the dashboards already see.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

use crate::realtime::{ClientMessage, Event};
use crate::server::AppState;

/// Upgrade to the realtime channel
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "Switching to the WebSocket protocol")
    ),
    tag = "realtime"
)]
pub async fn ws_upgrade(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (conn_id, mut frames) = state.hub.register();
    tracing::debug!("Realtime connection {} opened", conn_id);

    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::Join { room }) => {
                    state.hub.join(conn_id, &room);
                }
                Ok(ClientMessage::Leave { room }) => {
                    state.hub.leave(conn_id, &room);
                }
                Ok(ClientMessage::TechPosition { payload }) => {
                    // Position pings from the mobile app are relayed to
                    // every dashboard, same as the HTTP position endpoint.
                    state.hub.broadcast(&Event::tech_position_update(payload));
                }
                Err(err) => {
                    tracing::debug!("Unparseable realtime message from {}: {}", conn_id, err);
                }
            },
            Message::Close(_) => break,
            // Ping/pong is handled by axum; binary frames are not part of
            // the wire contract.
            _ => {}
        }
    }

    state.hub.unregister(conn_id);
    writer.abort();
    tracing::debug!("Realtime connection {} closed", conn_id);
}
