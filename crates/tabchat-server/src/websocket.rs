//! Per-session WebSocket event streaming.

use crate::state::AppState;
use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tabchat_core::SessionEvent;
use tabchat_types::{WsClientMessage, WsServerMessage};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle one session's WebSocket connection.
///
/// On connect the current session state is sent, then every event for this
/// session is forwarded until either side disconnects. Incoming traffic is
/// keepalive only.
pub async fn handle_websocket(
    socket: WebSocket,
    state: Arc<AppState>,
    session_id: Uuid,
) -> Result<()> {
    let session = state.session_manager.get_session(session_id).await?;

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsServerMessage>();

    out_tx.send(WsServerMessage::SessionInit {
        session_id: session.id,
        status: session.status,
        turn_count: session.turns.len(),
        has_snapshot: session.snapshot.is_some(),
        has_credential: session.has_credential,
    })?;

    tracing::info!(target: "tabchat::ws", "Client connected to session {}", session_id);

    // Forward session events for this session into the outbound queue.
    let mut event_rx = state.session_manager.subscribe();
    let event_out = out_tx.clone();
    let mut event_task = tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            if event_session(&event) != session_id {
                continue;
            }
            if event_out.send(server_message(event)).is_err() {
                break;
            }
        }
    });

    // Drain the outbound queue onto the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(_) => continue,
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages (keepalive pings).
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => {
                    if let Ok(WsClientMessage::Ping { timestamp }) =
                        serde_json::from_str::<WsClientMessage>(&text)
                    {
                        if out_tx.send(WsServerMessage::Pong { timestamp }).is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::debug!(target: "tabchat::ws", "Client closed connection");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            event_task.abort();
            recv_task.abort();
        }
        _ = &mut event_task => {
            send_task.abort();
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
            event_task.abort();
        }
    }

    tracing::info!(target: "tabchat::ws", "Client disconnected from session {}", session_id);
    Ok(())
}

fn event_session(event: &SessionEvent) -> Uuid {
    match event {
        SessionEvent::ReplyDelta { session_id, .. }
        | SessionEvent::ReplyComplete { session_id, .. }
        | SessionEvent::SnapshotReplaced { session_id, .. }
        | SessionEvent::Chart { session_id, .. }
        | SessionEvent::ExecutionResult { session_id, .. }
        | SessionEvent::Notice { session_id, .. } => *session_id,
    }
}

/// Map a session event onto the wire protocol.
fn server_message(event: SessionEvent) -> WsServerMessage {
    match event {
        SessionEvent::ReplyDelta { session_id, delta } => {
            WsServerMessage::ReplyDelta { session_id, delta }
        }
        SessionEvent::ReplyComplete {
            session_id,
            envelope,
        } => WsServerMessage::ReplyComplete {
            session_id,
            envelope,
        },
        SessionEvent::SnapshotReplaced {
            session_id,
            columns,
            total_rows,
        } => WsServerMessage::SnapshotReplaced {
            session_id,
            columns,
            total_rows,
        },
        SessionEvent::Chart { session_id, spec } => WsServerMessage::Chart { session_id, spec },
        SessionEvent::ExecutionResult {
            session_id,
            output,
            is_error,
        } => WsServerMessage::ExecutionResult {
            session_id,
            output,
            is_error,
        },
        SessionEvent::Notice {
            session_id,
            code,
            message,
        } => WsServerMessage::Notice {
            session_id,
            code,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabchat_types::ResponseEnvelope;

    #[test]
    fn test_event_session_extraction() {
        let id = Uuid::new_v4();
        let event = SessionEvent::ReplyDelta {
            session_id: id,
            delta: "x".into(),
        };
        assert_eq!(event_session(&event), id);
    }

    #[test]
    fn test_events_map_onto_wire_protocol() {
        let id = Uuid::new_v4();
        let msg = server_message(SessionEvent::ReplyComplete {
            session_id: id,
            envelope: ResponseEnvelope::PlainText {
                content: "hi".into(),
            },
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "reply_complete");
        assert_eq!(json["envelope"]["type"], "plain_text");

        let msg = server_message(SessionEvent::Notice {
            session_id: id,
            code: "credential_missing".into(),
            message: "No API credential set for this session".into(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "notice");
        assert_eq!(json["code"], "credential_missing");
    }
}
