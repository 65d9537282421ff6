//! Session records and status.

use crate::{ConversationTurn, TabularSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Waiting for user input.
    Ready,
    /// A completion request is in flight and its reply is streaming.
    Streaming,
}

/// Full view of a session, including its conversation.
///
/// The credential is deliberately absent: it is held in memory only and
/// never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Whether an API credential has been supplied.
    pub has_credential: bool,
    /// Preview text (first prompt, truncated).
    pub preview: String,
    pub turns: Vec<ConversationTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TabularSnapshot>,
}

/// Summary view of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub has_credential: bool,
    pub has_snapshot: bool,
    pub turn_count: usize,
    pub preview: String,
}

impl From<Session> for SessionSummary {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            status: s.status,
            created_at: s.created_at,
            last_activity_at: s.last_activity_at,
            has_credential: s.has_credential,
            has_snapshot: s.snapshot.is_some(),
            turn_count: s.turns.len(),
            preview: s.preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_session() {
        let session = Session {
            id: Uuid::new_v4(),
            status: SessionStatus::Ready,
            created_at: Utc::now(),
            last_activity_at: Utc::now(),
            has_credential: true,
            preview: "What's the average?".into(),
            turns: vec![
                ConversationTurn::user("What's the average?"),
                ConversationTurn::assistant("5.2"),
            ],
            snapshot: None,
        };

        let summary = SessionSummary::from(session);
        assert_eq!(summary.turn_count, 2);
        assert!(summary.has_credential);
        assert!(!summary.has_snapshot);
    }
}
