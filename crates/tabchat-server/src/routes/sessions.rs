//! Session management routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabchat_core::ApiCredential;
use tabchat_types::{Session, SessionSummary};
use uuid::Uuid;

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<SessionListResponse> {
    let sessions = state.session_manager.list_sessions().await;
    Json(SessionListResponse { sessions })
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    /// API credential for the completion endpoint. Optional at creation;
    /// without one, model interaction stays blocked.
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub ws_url: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let credential = req.credential.map(ApiCredential::new);
    let session = state.session_manager.create_session(credential)?;

    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        ws_url: format!("/ws/sessions/{}", session.id),
    }))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let session = state.session_manager.get_session(id).await?;
    Ok(Json(session))
}

/// Delete a session permanently.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.session_manager.delete_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear a session's conversation and snapshot.
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.session_manager.reset_session(id).await?;
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
pub struct SetCredentialRequest {
    pub credential: String,
}

/// Attach or replace the session's API credential.
pub async fn set_credential(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetCredentialRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .session_manager
        .set_credential(id, ApiCredential::new(req.credential))
        .await?;
    Ok(StatusCode::OK)
}
