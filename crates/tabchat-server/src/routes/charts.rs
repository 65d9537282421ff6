//! Chart request routes.
//!
//! Two request shapes: explicit axis picks, or free text run through the
//! keyword heuristic. Either way the referenced columns are validated
//! against the session's snapshot before a spec is emitted; candidates
//! from extraction are never trusted as-is.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tabchat_core::{extract_column_pair, SessionEvent, TabchatError};
use tabchat_types::{ChartKind, ChartSpec, TabularSnapshot};
use tracing::info;
use uuid::Uuid;

/// Keyword pair for the free-text heuristic: "plot A vs B".
const TRIGGER_WORD: &str = "plot";
const SEPARATOR_WORD: &str = "vs";

#[derive(Deserialize)]
pub struct ChartRequest {
    /// Free text to run through the keyword heuristic.
    #[serde(default)]
    pub text: Option<String>,
    /// Explicit axis picks; take precedence over `text`.
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub kind: Option<ChartKind>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub x_range: Option<[f64; 2]>,
    #[serde(default)]
    pub y_range: Option<[f64; 2]>,
}

/// Build a chart description for the rendering sink.
pub async fn create_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChartRequest>,
) -> Result<Json<ChartSpec>, ApiError> {
    let session = state.session_manager.get_session(id).await?;
    let snapshot = session.snapshot.ok_or(TabchatError::DatasetMissing)?;

    let spec = match resolve_spec(&req, &snapshot) {
        Ok(spec) => spec,
        Err(e) => {
            // Extraction and validation failures are user-visible, never
            // session-fatal.
            state.session_manager.notify_error(id, &e);
            return Err(ApiError(e));
        }
    };

    info!(
        target: "tabchat::api",
        "Session {} chart: {} x={} y={:?}",
        id,
        spec.kind.as_str(),
        spec.x,
        spec.y
    );

    state.session_manager.broadcast(SessionEvent::Chart {
        session_id: id,
        spec: spec.clone(),
    });

    Ok(Json(spec))
}

/// Turn a request into a validated spec.
fn resolve_spec(req: &ChartRequest, snapshot: &TabularSnapshot) -> tabchat_core::Result<ChartSpec> {
    let kind = req.kind.unwrap_or(ChartKind::Line);

    let (x, y) = if let Some(x) = &req.x {
        (x.clone(), req.y.clone())
    } else if let Some(text) = &req.text {
        let (x, y) = extract_column_pair(text, TRIGGER_WORD, SEPARATOR_WORD)?;
        (x, Some(y))
    } else {
        return Err(TabchatError::InvalidRequest(
            "chart request needs either explicit columns or text".to_string(),
        ));
    };

    let y = match (kind.requires_y(), y) {
        (true, Some(y)) => Some(y),
        (true, None) => {
            return Err(TabchatError::InvalidRequest(format!(
                "{} charts need both x and y columns",
                kind.as_str()
            )));
        }
        (false, _) => None,
    };

    validate_columns(snapshot, kind, &x, y.as_deref(), req.color.as_deref())?;

    let mut spec = ChartSpec::new(kind, x, y);
    spec.color = req.color.clone();
    spec.x_range = req.x_range;
    spec.y_range = req.y_range;
    Ok(spec)
}

/// Membership (and numeric-ness where the kind demands it) checks against
/// the actual column set.
fn validate_columns(
    snapshot: &TabularSnapshot,
    kind: ChartKind,
    x: &str,
    y: Option<&str>,
    color: Option<&str>,
) -> tabchat_core::Result<()> {
    for column in [Some(x), y, color].into_iter().flatten() {
        if !snapshot.has_column(column) {
            return Err(TabchatError::ColumnNotFound(column.to_string()));
        }
    }

    let numeric_required: Vec<&str> = match kind {
        ChartKind::Histogram => vec![x],
        ChartKind::Line | ChartKind::Scatter => {
            let mut cols = vec![x];
            cols.extend(y);
            cols
        }
        // Bar charts take a categorical x; only the measure must be numeric.
        ChartKind::Bar => y.into_iter().collect(),
    };

    for column in numeric_required {
        if !snapshot.is_numeric(column) {
            return Err(TabchatError::InvalidRequest(format!(
                "column '{}' is not numeric",
                column
            )));
        }
    }

    Ok(())
}
