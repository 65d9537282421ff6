//! Exchange orchestration.
//!
//! Drives one full user turn: assemble the context, stream the reply while
//! forwarding deltas, then classify, commit to history and dispatch any
//! code directive. Runs as a spawned task so the submitting request
//! returns immediately; progress reaches clients over the session
//! WebSocket.

use crate::state::AppState;
use std::sync::Arc;
use tabchat_core::{CompletionEvent, SessionEvent, TabchatError};
use tabchat_types::SessionStatus;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Run one exchange for a session.
///
/// Failures are converted to notices; the session always returns to
/// `Ready`. History is only touched after the reply stream completes
/// successfully.
pub async fn run_exchange(state: Arc<AppState>, session_id: Uuid, user_text: String) {
    let manager = &state.session_manager;

    let ctx = match manager.get(session_id) {
        Ok(ctx) => ctx,
        Err(e) => {
            manager.notify_error(session_id, &e);
            return;
        }
    };

    // Assemble under a read lock; the history itself stays untouched until
    // the exchange succeeds.
    let (assembled, credential) = {
        let ctx = ctx.read().await;
        match ctx.credential() {
            Some(credential) => (ctx.assemble(&user_text), credential.clone()),
            None => {
                manager.notify_error(session_id, &TabchatError::CredentialMissing);
                return;
            }
        }
    };

    let _ = manager.set_status(session_id, SessionStatus::Streaming).await;

    let mut rx = match state.completion.stream_chat(&credential, &assembled).await {
        Ok(rx) => rx,
        Err(e) => {
            let _ = manager.set_status(session_id, SessionStatus::Ready).await;
            manager.notify_error(session_id, &e);
            return;
        }
    };

    // Accumulate the full reply while forwarding each delta for display.
    // Classification waits for the stream to be exhausted.
    let mut reply = String::new();
    let mut completed = false;
    let mut failure = None;
    while let Some(event) = rx.recv().await {
        match event {
            CompletionEvent::Delta(delta) => {
                reply.push_str(&delta);
                manager.broadcast(SessionEvent::ReplyDelta {
                    session_id,
                    delta,
                });
            }
            CompletionEvent::Done => {
                completed = true;
                break;
            }
            CompletionEvent::Failed(message) => {
                failure = Some(TabchatError::CompletionFailed(message));
                break;
            }
        }
    }

    if !completed {
        warn!(
            target: "tabchat::session",
            "Session {} exchange abandoned; history unchanged",
            session_id
        );
        let _ = manager.set_status(session_id, SessionStatus::Ready).await;
        let e = failure.unwrap_or_else(|| {
            TabchatError::CompletionFailed("stream ended without completing".to_string())
        });
        manager.notify_error(session_id, &e);
        return;
    }

    debug!(
        target: "tabchat::session",
        "Session {} reply complete ({} chars)",
        session_id,
        reply.len()
    );

    let envelope = {
        let mut ctx = ctx.write().await;
        let envelope = ctx.commit_exchange(assembled, &reply);
        ctx.status = SessionStatus::Ready;
        envelope
    };

    let is_code = envelope.is_code();
    manager.broadcast(SessionEvent::ReplyComplete {
        session_id,
        envelope: envelope.clone(),
    });

    if is_code {
        dispatch_code(&state, session_id, envelope.payload()).await;
    }
}

/// Hand a code directive to the execution sink and report the outcome.
///
/// The payload goes to the sink verbatim; nothing here validates or
/// sandboxes it. With execution disabled the directive is surfaced as a
/// notice instead.
async fn dispatch_code(state: &Arc<AppState>, session_id: Uuid, code: &str) {
    let manager = &state.session_manager;

    if !state.execution.is_enabled() {
        manager.notify_error(
            session_id,
            &TabchatError::ExecutionFailure(
                "the reply contained code, but execution is disabled on this server".to_string(),
            ),
        );
        return;
    }

    info!(
        target: "tabchat::exec",
        "Session {} dispatching code directive to execution sink",
        session_id
    );

    match state.execution.execute(code).await {
        Ok(output) => {
            manager.broadcast(SessionEvent::ExecutionResult {
                session_id,
                output,
                is_error: false,
            });
        }
        Err(e) => {
            manager.broadcast(SessionEvent::ExecutionResult {
                session_id,
                output: e.to_string(),
                is_error: true,
            });
        }
    }
}
