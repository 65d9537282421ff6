//! Integration tests for the session lifecycle and chat surface.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tabchat_core::SessionEvent;
use tabchat_server::{config::Config, routes, state::AppState};
use tower::ServiceExt;
use uuid::Uuid;

/// Build a test app wired like the production router.
fn create_test_app() -> (Router, Arc<AppState>) {
    let config = Config {
        // Unroutable endpoint: exchanges fail fast instead of reaching out.
        endpoint_url: "http://127.0.0.1:9/v1".to_string(),
        max_concurrent_sessions: 5,
        ..Config::default()
    };

    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/api/sessions", get(routes::sessions::list))
        .route("/api/sessions", post(routes::sessions::create))
        .route("/api/sessions/{id}", get(routes::sessions::get))
        .route("/api/sessions/{id}", delete(routes::sessions::delete))
        .route("/api/sessions/{id}/reset", post(routes::sessions::reset))
        .route(
            "/api/sessions/{id}/credential",
            put(routes::sessions::set_credential),
        )
        .route("/api/sessions/{id}/dataset", post(routes::upload::upload))
        .route("/api/sessions/{id}/dataset", get(routes::upload::get_dataset))
        .route("/api/sessions/{id}/messages", post(routes::chat::post_message))
        .route("/api/sessions/{id}/charts", post(routes::charts::create_chart))
        .route("/health", get(routes::health))
        .with_state(state.clone());

    (app, state)
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_bytes(app: &Router, uri: &str, body: &[u8]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body.to_vec()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_session(app: &Router, credential: Option<&str>) -> Uuid {
    let body = match credential {
        Some(c) => json!({ "credential": c }),
        None => json!({}),
    };
    let (status, value) = send_json(app, "POST", "/api/sessions", body).await;
    assert_eq!(status, StatusCode::OK);
    value["session_id"].as_str().unwrap().parse().unwrap()
}

const SAMPLE_CSV: &[u8] = b"region,units,price\nnorth,12,3.5\nsouth,7,2.25\n";

#[tokio::test]
async fn test_health() {
    let (app, _state) = create_test_app();
    let (status, value) = send_json(&app, "GET", "/health", json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (app, _state) = create_test_app();
    let id = create_session(&app, None).await;

    let (status, value) = send_json(&app, "GET", "/api/sessions", json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["sessions"].as_array().unwrap().len(), 1);

    let (status, value) = send_json(&app, "GET", &format!("/api/sessions/{}", id), json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["status"], "ready");
    assert_eq!(value["has_credential"], false);
    assert!(value["turns"].as_array().unwrap().is_empty());

    let (status, _) =
        send_json(&app, "DELETE", &format!("/api/sessions/{}", id), json!(null)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, "GET", &format!("/api/sessions/{}", id), json!(null)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let (app, _state) = create_test_app();
    let (status, value) = send_json(
        &app,
        "GET",
        &format!("/api/sessions/{}", Uuid::new_v4()),
        json!(null),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["error"], "session_not_found");
}

#[tokio::test]
async fn test_session_limit_enforced() {
    let (app, _state) = create_test_app();
    for _ in 0..5 {
        create_session(&app, None).await;
    }
    let (status, value) = send_json(&app, "POST", "/api/sessions", json!({})).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(value["error"], "session_limit_exceeded");
}

#[tokio::test]
async fn test_upload_and_fetch_dataset() {
    let (app, _state) = create_test_app();
    let id = create_session(&app, None).await;

    let uri = format!("/api/sessions/{}/dataset?filename=sales.csv", id);
    let (status, value) = send_bytes(&app, &uri, SAMPLE_CSV).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["columns"], json!(["region", "units", "price"]));
    assert_eq!(value["numeric_columns"], json!(["units", "price"]));
    assert_eq!(value["total_rows"], 2);

    let (status, value) =
        send_json(&app, "GET", &format!("/api/sessions/{}/dataset", id), json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["source_name"], "sales.csv");
}

#[tokio::test]
async fn test_bad_upload_leaves_session_usable() {
    let (app, state) = create_test_app();
    let id = create_session(&app, None).await;
    let mut events = state.session_manager.subscribe();

    let uri = format!("/api/sessions/{}/dataset", id);
    let (status, value) = send_bytes(&app, &uri, b"").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"], "upload_parse_failure");

    // The failure is surfaced as a notice and the session continues
    // without a snapshot.
    match events.recv().await.unwrap() {
        SessionEvent::Notice { code, .. } => assert_eq!(code, "upload_parse_failure"),
        other => panic!("unexpected event: {:?}", other),
    }

    let (status, value) =
        send_json(&app, "GET", &format!("/api/sessions/{}/dataset", id), json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_reset_clears_dataset() {
    let (app, _state) = create_test_app();
    let id = create_session(&app, None).await;

    let uri = format!("/api/sessions/{}/dataset", id);
    let (status, _) = send_bytes(&app, &uri, SAMPLE_CSV).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        send_json(&app, "POST", &format!("/api/sessions/{}/reset", id), json!(null)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, value) =
        send_json(&app, "GET", &format!("/api/sessions/{}/dataset", id), json!(null)).await;
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_message_without_credential_is_blocked() {
    let (app, state) = create_test_app();
    let id = create_session(&app, None).await;
    let mut events = state.session_manager.subscribe();

    let (status, value) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        json!({ "content": "What's the average?" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["error"], "credential_missing");

    match events.recv().await.unwrap() {
        SessionEvent::Notice { code, .. } => assert_eq!(code, "credential_missing"),
        other => panic!("unexpected event: {:?}", other),
    }

    // Conversation state is untouched.
    let (_, value) = send_json(&app, "GET", &format!("/api/sessions/{}", id), json!(null)).await;
    assert!(value["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_message_with_credential_is_accepted() {
    let (app, _state) = create_test_app();
    let id = create_session(&app, Some("sk-test")).await;

    let (status, value) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        json!({ "content": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(value["status"], "streaming");
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let (app, _state) = create_test_app();
    let id = create_session(&app, Some("sk-test")).await;

    let (status, value) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        json!({ "content": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["error"], "invalid_request");
}

#[tokio::test]
async fn test_set_credential_after_creation() {
    let (app, _state) = create_test_app();
    let id = create_session(&app, None).await;

    let (status, _) = send_json(
        &app,
        "PUT",
        &format!("/api/sessions/{}/credential", id),
        json!({ "credential": "sk-late" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, value) = send_json(&app, "GET", &format!("/api/sessions/{}", id), json!(null)).await;
    assert_eq!(value["has_credential"], true);
}

#[tokio::test]
async fn test_failed_exchange_leaves_history_untouched() {
    let (app, state) = create_test_app();
    let id = create_session(&app, Some("sk-test")).await;
    let mut events = state.session_manager.subscribe();

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        json!({ "content": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // The endpoint is unroutable; the exchange fails into a notice.
    match events.recv().await.unwrap() {
        SessionEvent::Notice { session_id, .. } => assert_eq!(session_id, id),
        other => panic!("unexpected event: {:?}", other),
    }

    let (_, value) = send_json(&app, "GET", &format!("/api/sessions/{}", id), json!(null)).await;
    assert!(value["turns"].as_array().unwrap().is_empty());
    assert_eq!(value["status"], "ready");
}
