// Integration tests for the auth flow routes

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use graphgate::api::{create_auth_router, AuthAppState};
use graphgate::config::Settings;
use graphgate::credentials::{TokenGrant, TokenStore};

fn test_settings() -> Settings {
    Settings {
        client_id: "test-client-id".to_string(),
        tenant_id: "test-tenant".to_string(),
        redirect_uri: "http://localhost:8000/auth/callback".to_string(),
        client_secret: String::new(),
        scopes: vec!["User.Read".to_string(), "Mail.Send".to_string()],
        secret_key: "test-secret".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

fn create_test_app() -> (Router, Arc<TokenStore>) {
    let store = Arc::new(TokenStore::new("test-secret"));
    let app = create_auth_router(AuthAppState {
        store: store.clone(),
        settings: Arc::new(test_settings()),
    });
    (app, store)
}

fn test_grant(with_refresh_token: bool) -> TokenGrant {
    TokenGrant {
        access_token: "access-token".to_string(),
        refresh_token: with_refresh_token.then(|| "refresh-token".to_string()),
        expires_in: 3600,
        scope: "User.Read Mail.Send".to_string(),
        token_type: "Bearer".to_string(),
    }
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
async fn test_login_redirects_with_pkce_and_stores_verifier() {
    let (app, store) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("redirect must carry a Location header")
        .to_string();

    assert!(location
        .starts_with("https://login.microsoftonline.com/test-tenant/oauth2/v2.0/authorize?"));
    assert!(location.contains("client_id=test-client-id"));
    assert!(location.contains("code_challenge="));
    assert!(location.contains("code_challenge_method=S256"));

    // The state in the URL must have a stored verifier waiting for it
    let state = location
        .split("state=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .expect("auth URL carries a state parameter");
    assert!(store.take_code_verifier(state).is_some());
}

#[tokio::test]
async fn test_login_states_are_unique() {
    let (app, _store) = create_test_app();

    let mut locations = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        locations.push(
            response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .unwrap()
                .to_string(),
        );
    }

    assert_ne!(locations[0], locations[1]);
}

#[tokio::test]
async fn test_callback_rejects_unknown_state() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/callback?code=auth_code&state=never_issued")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Fails before any token exchange is attempted
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Invalid state parameter"));
}

#[tokio::test]
async fn test_callback_reports_provider_error() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/callback?error=access_denied&error_description=User+cancelled")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("access_denied"));
}

#[tokio::test]
async fn test_callback_requires_code_and_state() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/callback?state=some_state")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("'code'"));
}

#[tokio::test]
async fn test_refresh_unknown_user_is_not_found() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(json_request("/auth/refresh", r#"{"user_id": "ghost"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refresh_without_refresh_token_is_bad_request() {
    let (app, store) = create_test_app();
    store.store_tokens("user1", &test_grant(false)).unwrap();

    let response = app
        .oneshot(json_request("/auth/refresh", r#"{"user_id": "user1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("No refresh token available"));
}

#[tokio::test]
async fn test_logout_removes_session() {
    let (app, store) = create_test_app();
    store.store_tokens("user1", &test_grant(true)).unwrap();

    let response = app
        .clone()
        .oneshot(json_request("/auth/logout", r#"{"user_id": "user1"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.get_tokens("user1").is_none());

    // Logging out again finds no session
    let response = app
        .oneshot(json_request("/auth/logout", r#"{"user_id": "user1"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_unauthenticated_user() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/status/nobody")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["authenticated"], false);
    assert_eq!(json["user_id"], "nobody");
}

#[tokio::test]
async fn test_status_authenticated_user() {
    let (app, store) = create_test_app();
    store.store_tokens("user1", &test_grant(true)).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/status/user1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["token_expired"], false);
    assert_eq!(json["has_refresh_token"], true);
}
