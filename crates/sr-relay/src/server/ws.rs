//! WebSocket transport channel
//!
//! One socket per browser client. Incoming `command` frames are relayed
//! concurrently, each in its own task, so a slow command never blocks the
//! next one from being issued. Outgoing frames are funneled through an mpsc
//! channel into a single writer task. Session status changes are pushed to
//! every socket as `session` events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use sr_core::{CommandRequest, SessionStatus};
use sr_protocol::{ClientMessage, ProtocolError, ServerMessage};

use crate::state::RelayState;

/// Buffered outgoing frames per socket
const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

/// Frames queued for the writer task
enum Outbound {
    Json(ServerMessage),
    Pong(Vec<u8>),
}

/// `GET /ws`: upgrade to the duplex channel
pub(super) async fn ws_upgrade(
    State(state): State<Arc<RelayState>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn session_event(status: &SessionStatus) -> ServerMessage {
    ServerMessage::Session {
        state: status.state,
        generation: status.generation.as_u64(),
        error: status.error.clone(),
    }
}

/// Build the command request for a decoded client frame
pub(crate) fn command_request(state: &RelayState, message: ClientMessage) -> CommandRequest {
    match message {
        ClientMessage::Command { command, args } => {
            CommandRequest::new(state.resolve_command(&command), args)
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<RelayState>) {
    let client_id = state.hub.attach();
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Outbound>(OUTBOUND_CHANNEL_CAPACITY);

    let send_task = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let frame = match outbound {
                Outbound::Json(message) => match message.encode() {
                    Ok(text) => Message::Text(text),
                    Err(e) => {
                        tracing::error!("Failed to encode outgoing message: {}", e);
                        continue;
                    }
                },
                Outbound::Pong(data) => Message::Pong(data),
            };
            if ws_sink.send(frame).await.is_err() {
                tracing::debug!("WebSocket send failed, client disconnected");
                break;
            }
        }
    });

    let mut status_rx = state.sessions.subscribe();
    let initial = session_event(&status_rx.borrow_and_update());
    let _ = tx.send(Outbound::Json(initial)).await;

    loop {
        tokio::select! {
            incoming = ws_stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = tx.send(Outbound::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        let err = ProtocolError::UnexpectedBinary;
                        let _ = tx.send(Outbound::Json(ServerMessage::error(err.to_string()))).await;
                        continue;
                    }
                    Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error from {}: {}", client_id, e);
                        break;
                    }
                };

                let message = match ClientMessage::decode(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::debug!("Bad frame from {}: {}", client_id, e);
                        let _ = tx.send(Outbound::Json(ServerMessage::error(e.to_string()))).await;
                        continue;
                    }
                };

                let request = command_request(&state, message);
                let state = Arc::clone(&state);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let event = state.relay.handle_command(&request).await;
                    let _ = tx.send(Outbound::Json(event)).await;
                });
            }

            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let event = session_event(&status_rx.borrow_and_update());
                let _ = tx.send(Outbound::Json(event)).await;
            }
        }
    }

    state.hub.detach(client_id);
    drop(tx);
    if let Err(e) = send_task.await {
        tracing::debug!("WebSocket writer for {} ended abnormally: {}", client_id, e);
    }
}
