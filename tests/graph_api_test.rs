// Integration tests for the Graph operation routes: token gating and
// local validation. Successful Graph calls are covered against a mock
// server in graph_client_test.rs.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use graphgate::api::{create_graph_router, GraphAppState};
use graphgate::credentials::{TokenGrant, TokenStore};

fn create_test_app() -> (Router, Arc<TokenStore>) {
    let store = Arc::new(TokenStore::new("test-secret"));
    let app = create_graph_router(GraphAppState {
        store: store.clone(),
    });
    (app, store)
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_draft_requires_authentication() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(json_request(
            "/graph/email/draft",
            r#"{
                "user_id": "nobody",
                "to": ["user@example.com"],
                "subject": "Hello",
                "body": "World"
            }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let (app, store) = create_test_app();

    // Token whose lifetime has already elapsed
    store
        .store_tokens(
            "user1",
            &TokenGrant {
                access_token: "stale-token".to_string(),
                refresh_token: Some("refresh-token".to_string()),
                expires_in: 0,
                scope: "Mail.Send".to_string(),
                token_type: "Bearer".to_string(),
            },
        )
        .unwrap();

    let response = app
        .oneshot(json_request(
            "/graph/email/search",
            r#"{"user_id": "user1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn test_send_validation_fails_before_any_network_call() {
    let (app, store) = create_test_app();

    store
        .store_tokens(
            "user1",
            &TokenGrant {
                access_token: "valid-token".to_string(),
                refresh_token: None,
                expires_in: 3600,
                scope: "Mail.Send".to_string(),
                token_type: "Bearer".to_string(),
            },
        )
        .unwrap();

    // Only `to` is set: no subject/body and no draft_id
    let response = app
        .oneshot(json_request(
            "/graph/email/send",
            r#"{"user_id": "user1", "to": ["user@example.com"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("subject"));
}

#[tokio::test]
async fn test_read_requires_authentication() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(json_request(
            "/graph/email/read",
            r#"{"user_id": "nobody", "message_id": "msg123"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_meeting_requires_authentication() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(json_request(
            "/graph/calendar/meeting",
            r#"{
                "user_id": "nobody",
                "subject": "Review",
                "attendees": ["team@example.com"],
                "start": "2024-01-15T14:00:00",
                "end": "2024-01-15T15:00:00"
            }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_availability_requires_authentication() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(json_request(
            "/graph/calendar/availability",
            r#"{
                "user_id": "nobody",
                "attendees": ["alice@example.com"],
                "duration_minutes": 30,
                "start": "2024-01-15T09:00:00",
                "end": "2024-01-16T17:00:00"
            }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
