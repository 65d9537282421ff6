//! Chat message route.

use crate::error::ApiError;
use crate::exchange;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabchat_core::TabchatError;
use tabchat_types::SessionStatus;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct PostMessageResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
}

#[derive(Serialize)]
struct BusyResponse {
    error: &'static str,
    message: &'static str,
}

/// Submit a user message and start an exchange.
///
/// Returns 202 once the exchange task is spawned; the reply streams over
/// the session WebSocket. Without a credential the request is rejected and
/// a persistent notice is broadcast; conversation state is untouched.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Response, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError(TabchatError::InvalidRequest(
            "message content must not be empty".to_string(),
        )));
    }

    let ctx = state.session_manager.get(id)?;
    {
        let ctx = ctx.read().await;
        if ctx.status == SessionStatus::Streaming {
            return Ok((
                StatusCode::CONFLICT,
                Json(BusyResponse {
                    error: "busy",
                    message: "a reply is already streaming for this session",
                }),
            )
                .into_response());
        }
        if ctx.credential().is_none() {
            state
                .session_manager
                .notify_error(id, &TabchatError::CredentialMissing);
            return Err(ApiError(TabchatError::CredentialMissing));
        }
    }

    tokio::spawn(exchange::run_exchange(state.clone(), id, req.content));

    Ok((
        StatusCode::ACCEPTED,
        Json(PostMessageResponse {
            session_id: id,
            status: SessionStatus::Streaming,
        }),
    )
        .into_response())
}
