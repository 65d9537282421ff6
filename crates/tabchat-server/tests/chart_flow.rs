//! Integration tests for the chart surface.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tabchat_core::SessionEvent;
use tabchat_server::{config::Config, routes, state::AppState};
use tower::ServiceExt;
use uuid::Uuid;

fn create_test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::default()));

    let app = Router::new()
        .route("/api/sessions", post(routes::sessions::create))
        .route("/api/sessions/{id}", get(routes::sessions::get))
        .route("/api/sessions/{id}/dataset", post(routes::upload::upload))
        .route("/api/sessions/{id}/charts", post(routes::charts::create_chart))
        .with_state(state.clone());

    (app, state)
}

async fn request(app: &Router, method: &str, uri: &str, body: Body, json_body: bool) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if json_body {
        builder = builder.header("content-type", "application/json");
    }
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn session_with_dataset(app: &Router) -> Uuid {
    let (status, value) = request(
        app,
        "POST",
        "/api/sessions",
        Body::from(json!({}).to_string()),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id: Uuid = value["session_id"].as_str().unwrap().parse().unwrap();

    let csv = "team,satisfaction,hours\nalpha,4.2,12\nbeta,3.8,9\n";
    let (status, _) = request(
        app,
        "POST",
        &format!("/api/sessions/{}/dataset?filename=survey.csv", id),
        Body::from(csv),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    id
}

async fn post_chart(app: &Router, id: Uuid, body: Value) -> (StatusCode, Value) {
    request(
        app,
        "POST",
        &format!("/api/sessions/{}/charts", id),
        Body::from(body.to_string()),
        true,
    )
    .await
}

#[tokio::test]
async fn test_chart_from_free_text() {
    let (app, state) = create_test_app();
    let id = session_with_dataset(&app).await;
    let mut events = state.session_manager.subscribe();

    let (status, value) =
        post_chart(&app, id, json!({ "text": "please plot satisfaction vs hours" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["kind"], "line");
    assert_eq!(value["x"], "satisfaction");
    assert_eq!(value["y"], "hours");

    // The chart description is also broadcast to the rendering sink. The
    // upload event may still be queued; skip past it.
    loop {
        match events.recv().await.unwrap() {
            SessionEvent::Chart { session_id, spec } => {
                assert_eq!(session_id, id);
                assert_eq!(spec.x, "satisfaction");
                break;
            }
            SessionEvent::SnapshotReplaced { .. } => continue,
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_chart_with_explicit_axes() {
    let (app, _state) = create_test_app();
    let id = session_with_dataset(&app).await;

    let (status, value) = post_chart(
        &app,
        id,
        json!({ "kind": "scatter", "x": "hours", "y": "satisfaction" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["kind"], "scatter");
    assert_eq!(value["title"], "hours vs satisfaction");
}

#[tokio::test]
async fn test_histogram_single_column() {
    let (app, _state) = create_test_app();
    let id = session_with_dataset(&app).await;

    let (status, value) =
        post_chart(&app, id, json!({ "kind": "histogram", "x": "satisfaction" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(value.get("y").is_none() || value["y"].is_null());
}

#[tokio::test]
async fn test_unknown_column_rejected() {
    let (app, _state) = create_test_app();
    let id = session_with_dataset(&app).await;

    let (status, value) =
        post_chart(&app, id, json!({ "text": "plot happiness vs hours" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"], "column_not_found");
}

#[tokio::test]
async fn test_extraction_failure_is_surfaced_not_fatal() {
    let (app, state) = create_test_app();
    let id = session_with_dataset(&app).await;
    let mut events = state.session_manager.subscribe();

    let (status, value) = post_chart(&app, id, json!({ "text": "hello there" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"], "extraction_failure");

    match events.recv().await.unwrap() {
        SessionEvent::Notice { code, .. } => assert_eq!(code, "extraction_failure"),
        other => panic!("unexpected event: {:?}", other),
    }

    // The session is still usable afterwards.
    let (status, _) =
        post_chart(&app, id, json!({ "text": "plot satisfaction vs hours" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_chart_without_dataset_rejected() {
    let (app, _state) = create_test_app();
    let (status, value) = request(
        &app,
        "POST",
        "/api/sessions",
        Body::from(json!({}).to_string()),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id: Uuid = value["session_id"].as_str().unwrap().parse().unwrap();

    let (status, value) =
        post_chart(&app, id, json!({ "text": "plot satisfaction vs hours" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"], "dataset_missing");
}

#[tokio::test]
async fn test_non_numeric_axis_rejected() {
    let (app, _state) = create_test_app();
    let id = session_with_dataset(&app).await;

    let (status, value) =
        post_chart(&app, id, json!({ "text": "plot team vs hours" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"], "invalid_request");
}
