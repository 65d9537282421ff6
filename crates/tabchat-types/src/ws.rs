//! WebSocket message protocol between client and server.

use crate::{ChartSpec, ResponseEnvelope, SessionStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    /// Ping for keepalive.
    Ping { timestamp: u64 },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// Session state sent once on connect.
    SessionInit {
        session_id: Uuid,
        status: SessionStatus,
        turn_count: usize,
        has_snapshot: bool,
        has_credential: bool,
    },
    /// A fragment of a streaming reply; display may proceed immediately.
    ReplyDelta { session_id: Uuid, delta: String },
    /// The reply finished streaming and was classified.
    ReplyComplete {
        session_id: Uuid,
        envelope: ResponseEnvelope,
    },
    /// A new dataset replaced the session's snapshot.
    SnapshotReplaced {
        session_id: Uuid,
        columns: Vec<String>,
        total_rows: usize,
    },
    /// A validated chart description for the rendering sink.
    Chart { session_id: Uuid, spec: ChartSpec },
    /// Output from the execution sink.
    ExecutionResult {
        session_id: Uuid,
        output: String,
        is_error: bool,
    },
    /// A user-visible notice (recovered failures, degraded behavior).
    Notice {
        session_id: Uuid,
        code: String,
        message: String,
    },
    /// Keepalive response.
    Pong { timestamp: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_roundtrip() {
        let json = r#"{"type":"ping","timestamp":42}"#;
        let msg: WsClientMessage = serde_json::from_str(json).unwrap();
        let WsClientMessage::Ping { timestamp } = msg;
        assert_eq!(timestamp, 42);
    }

    #[test]
    fn test_server_message_tags() {
        let msg = WsServerMessage::ReplyDelta {
            session_id: Uuid::nil(),
            delta: "The avg".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "reply_delta");
        assert_eq!(json["delta"], "The avg");
    }

    #[test]
    fn test_envelope_embeds_in_reply_complete() {
        let msg = WsServerMessage::ReplyComplete {
            session_id: Uuid::nil(),
            envelope: ResponseEnvelope::CodeDirective {
                code: "plot(df)".into(),
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["envelope"]["type"], "code_directive");
    }
}
