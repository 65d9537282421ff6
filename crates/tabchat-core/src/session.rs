//! Session manager and session-scoped context.
//!
//! Each session owns its conversation state: the append-only turn history,
//! the current data snapshot and the API credential. Nothing is shared
//! across sessions and nothing outlives them; a reset clears the
//! conversation and snapshot, deletion drops everything.

use crate::{assemble_turns, classify_reply, ApiCredential, Result, TabchatError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tabchat_types::{
    ChartSpec, ConversationTurn, ResponseEnvelope, Session, SessionStatus, SessionSummary,
    TabularSnapshot,
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    pub max_concurrent_sessions: usize,
    /// Preview rows captured from each upload.
    pub preview_rows: usize,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: 10,
            preview_rows: 5,
        }
    }
}

/// Events emitted while sessions process exchanges, fanned out to
/// WebSocket clients.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ReplyDelta {
        session_id: Uuid,
        delta: String,
    },
    ReplyComplete {
        session_id: Uuid,
        envelope: ResponseEnvelope,
    },
    SnapshotReplaced {
        session_id: Uuid,
        columns: Vec<String>,
        total_rows: usize,
    },
    Chart {
        session_id: Uuid,
        spec: ChartSpec,
    },
    ExecutionResult {
        session_id: Uuid,
        output: String,
        is_error: bool,
    },
    Notice {
        session_id: Uuid,
        code: String,
        message: String,
    },
}

/// Session-scoped conversation state.
#[derive(Debug)]
pub struct SessionContext {
    pub id: Uuid,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    turns: Vec<ConversationTurn>,
    snapshot: Option<TabularSnapshot>,
    credential: Option<ApiCredential>,
    preview: String,
}

impl SessionContext {
    fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: SessionStatus::Ready,
            created_at: now,
            last_activity_at: now,
            turns: Vec::new(),
            snapshot: None,
            credential: None,
            preview: String::new(),
        }
    }

    /// The recorded turn history, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn snapshot(&self) -> Option<&TabularSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn credential(&self) -> Option<&ApiCredential> {
        self.credential.as_ref()
    }

    /// Build the turn sequence for one completion request without touching
    /// the recorded history.
    pub fn assemble(&self, user_text: &str) -> Vec<ConversationTurn> {
        assemble_turns(&self.turns, user_text, self.snapshot.as_ref())
    }

    /// Commit a finished exchange: the assembled sequence becomes the
    /// recorded history and the reply is appended as exactly one assistant
    /// turn, on both classification paths.
    ///
    /// This is the only place an assistant turn enters history.
    pub fn commit_exchange(
        &mut self,
        assembled: Vec<ConversationTurn>,
        reply: &str,
    ) -> ResponseEnvelope {
        if self.preview.is_empty() {
            if let Some(first_user) = assembled.last() {
                self.preview = truncate_preview(&first_user.content);
            }
        }

        let envelope = classify_reply(reply);
        self.turns = assembled;
        self.turns.push(ConversationTurn::assistant(reply));
        self.touch();
        envelope
    }

    /// Clear conversation and snapshot, keeping the session itself (and its
    /// credential) alive.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.snapshot = None;
        self.preview.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    fn to_session(&self) -> Session {
        Session {
            id: self.id,
            status: self.status,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
            has_credential: self.credential.is_some(),
            preview: self.preview.clone(),
            turns: self.turns.clone(),
            snapshot: self.snapshot.clone(),
        }
    }

    fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            status: self.status,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
            has_credential: self.credential.is_some(),
            has_snapshot: self.snapshot.is_some(),
            turn_count: self.turns.len(),
            preview: self.preview.clone(),
        }
    }
}

/// Manages all live sessions.
pub struct SessionManager {
    config: SessionManagerConfig,
    sessions: DashMap<Uuid, Arc<RwLock<SessionContext>>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(config: SessionManagerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            sessions: DashMap::new(),
            event_tx,
        }
    }

    pub fn config(&self) -> &SessionManagerConfig {
        &self.config
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event to all subscribers.
    pub fn broadcast(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Broadcast a recovered failure as a user-visible notice.
    pub fn notify_error(&self, session_id: Uuid, error: &TabchatError) {
        debug!(target: "tabchat::session", "Session {} notice: {}", session_id, error);
        self.broadcast(SessionEvent::Notice {
            session_id,
            code: error.code().to_string(),
            message: error.to_string(),
        });
    }

    /// Create a new session.
    pub fn create_session(&self, credential: Option<ApiCredential>) -> Result<Session> {
        if self.sessions.len() >= self.config.max_concurrent_sessions {
            return Err(TabchatError::SessionLimitExceeded(
                self.config.max_concurrent_sessions,
            ));
        }

        let id = Uuid::new_v4();
        let mut ctx = SessionContext::new(id);
        ctx.credential = credential;
        let session = ctx.to_session();

        self.sessions.insert(id, Arc::new(RwLock::new(ctx)));
        info!(target: "tabchat::session", "Session {} created", id);
        Ok(session)
    }

    /// Get a session's context handle.
    pub fn get(&self, session_id: Uuid) -> Result<Arc<RwLock<SessionContext>>> {
        self.sessions
            .get(&session_id)
            .map(|entry| entry.value().clone())
            .ok_or(TabchatError::SessionNotFound(session_id))
    }

    /// Full view of a session.
    pub async fn get_session(&self, session_id: Uuid) -> Result<Session> {
        let ctx = self.get(session_id)?;
        let ctx = ctx.read().await;
        Ok(ctx.to_session())
    }

    /// List all sessions, newest first.
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        // Collect handles first so no map shard stays locked across an await.
        let handles: Vec<Arc<RwLock<SessionContext>>> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for ctx in handles {
            summaries.push(ctx.read().await.to_summary());
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Clear a session's conversation and snapshot.
    pub async fn reset_session(&self, session_id: Uuid) -> Result<()> {
        let ctx = self.get(session_id)?;
        ctx.write().await.reset();
        info!(target: "tabchat::session", "Session {} reset", session_id);
        Ok(())
    }

    /// Delete a session permanently.
    pub fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.sessions
            .remove(&session_id)
            .ok_or(TabchatError::SessionNotFound(session_id))?;
        info!(target: "tabchat::session", "Session {} deleted", session_id);
        Ok(())
    }

    /// Attach or replace the session's API credential.
    pub async fn set_credential(&self, session_id: Uuid, credential: ApiCredential) -> Result<()> {
        let ctx = self.get(session_id)?;
        let mut ctx = ctx.write().await;
        ctx.credential = Some(credential);
        ctx.touch();
        // The credential value itself is never logged.
        info!(target: "tabchat::session", "Session {} credential set", session_id);
        Ok(())
    }

    /// Replace the session's snapshot wholesale and announce it.
    pub async fn set_snapshot(&self, session_id: Uuid, snapshot: TabularSnapshot) -> Result<()> {
        let ctx = self.get(session_id)?;
        {
            let mut ctx = ctx.write().await;
            ctx.snapshot = Some(snapshot.clone());
            ctx.touch();
        }
        info!(
            target: "tabchat::session",
            "Session {} snapshot replaced: {} ({} columns, {} rows)",
            session_id,
            snapshot.source_name,
            snapshot.columns.len(),
            snapshot.total_rows
        );
        self.broadcast(SessionEvent::SnapshotReplaced {
            session_id,
            columns: snapshot.columns,
            total_rows: snapshot.total_rows,
        });
        Ok(())
    }

    /// Update a session's status.
    pub async fn set_status(&self, session_id: Uuid, status: SessionStatus) -> Result<()> {
        let ctx = self.get(session_id)?;
        ctx.write().await.status = status;
        Ok(())
    }
}

fn truncate_preview(s: &str) -> String {
    const MAX_LEN: usize = 100;
    if s.len() <= MAX_LEN {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i <= MAX_LEN - 3)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        format!("{}...", &s[..cut])
    }
}
