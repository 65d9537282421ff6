//! Dataset upload routes.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tabchat_core::parse_dataset;
use tabchat_types::TabularSnapshot;
use tracing::info;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct UploadParams {
    /// Display name of the uploaded file.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Replace the session's dataset with the uploaded bytes.
///
/// A parse failure is surfaced inline (and as a notice); the session keeps
/// its previous snapshot, if any.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<TabularSnapshot>, ApiError> {
    // Validate the session before doing any parse work.
    state.session_manager.get(id)?;

    let filename = params.filename.as_deref().unwrap_or("upload.csv");
    let snapshot = match parse_dataset(filename, &body, state.config.preview_rows) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            state.session_manager.notify_error(id, &e);
            return Err(ApiError(e));
        }
    };

    info!(
        target: "tabchat::upload",
        "Session {} uploaded {} ({} bytes, {} rows)",
        id,
        filename,
        body.len(),
        snapshot.total_rows
    );

    state.session_manager.set_snapshot(id, snapshot.clone()).await?;
    Ok(Json(snapshot))
}

/// Current snapshot, if a dataset has been uploaded.
pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<TabularSnapshot>>, ApiError> {
    let session = state.session_manager.get_session(id).await?;
    Ok(Json(session.snapshot))
}
