//! OAuth 2.0 authorization-code-with-PKCE flow against Azure AD.
//!
//! 1. GET /auth/login → generate PKCE pair + state, redirect to Azure AD
//! 2. User signs in on Microsoft's page
//! 3. Azure AD redirects to /auth/callback with code + state
//! 4. Consume the stored verifier (single-use), exchange code for tokens
//! 5. Store encrypted tokens keyed by the user's object id

mod exchange;
mod provider;

pub use exchange::{extract_object_id, TokenResponse};
pub use provider::{azure_endpoints, build_auth_url, ProviderEndpoints};

use axum::{
    extract::{Path, Query, State},
    response::{Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AppError;
use crate::config::Settings;
use crate::credentials::TokenStore;
use crate::pkce;

/// Shared state for the auth API
#[derive(Clone)]
pub struct AuthAppState {
    pub store: Arc<TokenStore>,
    pub settings: Arc<Settings>,
}

/// OAuth callback query parameters
#[derive(Deserialize)]
pub struct OAuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Successful login response
#[derive(Serialize)]
pub struct LoginResponse {
    message: String,
    user_id: String,
    scopes: Vec<String>,
}

/// Request body for token refresh
#[derive(Deserialize)]
pub struct RefreshRequest {
    user_id: String,
}

/// Request body for logout
#[derive(Deserialize)]
pub struct LogoutRequest {
    user_id: String,
}

/// Authentication status for a user
#[derive(Serialize)]
pub struct StatusResponse {
    authenticated: bool,
    user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_expired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_refresh_token: Option<bool>,
}

/// Create the auth API router
pub fn create_auth_router(state: AuthAppState) -> Router {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/status/:user_id", get(auth_status))
        .with_state(Arc::new(state))
}

/// GET /auth/login
///
/// Starts the login flow: generates a PKCE pair and a CSRF state, stores
/// the verifier for the callback, and redirects to Azure AD.
async fn login(State(state): State<Arc<AuthAppState>>) -> Result<Redirect, AppError> {
    let (verifier, challenge) = pkce::generate_pair();
    let csrf_state = Uuid::new_v4().to_string();

    state.store.store_code_verifier(&csrf_state, &verifier);

    let auth_url = provider::build_auth_url(&state.settings, &csrf_state, &challenge);

    info!("redirecting to Azure AD authorization endpoint");
    Ok(Redirect::temporary(&auth_url))
}

/// GET /auth/callback
///
/// Completes the login flow: consumes the single-use verifier for the
/// returned state, exchanges the authorization code, and stores the
/// encrypted tokens keyed by the user's object id.
async fn callback(
    State(state): State<Arc<AuthAppState>>,
    Query(callback): Query<OAuthCallback>,
) -> Result<Json<LoginResponse>, AppError> {
    if let Some(error) = callback.error {
        let description = callback
            .error_description
            .unwrap_or_else(|| "Unknown error".to_string());
        warn!(error = %error, description = %description, "authorization failed at provider");
        return Err(AppError::BadRequest(format!(
            "Authentication failed: {} - {}",
            error, description
        )));
    }

    let code = callback
        .code
        .ok_or_else(|| AppError::BadRequest("Missing 'code' parameter".to_string()))?;
    let csrf_state = callback
        .state
        .ok_or_else(|| AppError::BadRequest("Missing 'state' parameter".to_string()))?;

    debug!(state = %csrf_state, "looking up PKCE verifier");

    // Single-use: a replayed state cannot reach the token endpoint twice
    let verifier = state.store.take_code_verifier(&csrf_state).ok_or_else(|| {
        warn!(state = %csrf_state, "unknown or already-consumed OAuth state");
        AppError::BadRequest("Invalid state parameter or code verifier expired".to_string())
    })?;

    let tokens = exchange::exchange_code(&state.settings, &code, &verifier)
        .await
        .map_err(|e| {
            warn!(error = %e, "authorization code exchange failed");
            AppError::BadGateway(format!("Failed to acquire token: {}", e))
        })?;

    let user_id = tokens
        .id_token
        .as_deref()
        .and_then(exchange::extract_object_id)
        .ok_or_else(|| {
            AppError::ServerError("Failed to extract user ID from token".to_string())
        })?;

    let scope = tokens.scope.clone().unwrap_or_default();
    state
        .store
        .store_tokens(&user_id, &tokens.to_grant())
        .map_err(|e| AppError::ServerError(format!("Failed to store tokens: {}", e)))?;

    info!(user_id = %user_id, "authentication completed");

    Ok(Json(LoginResponse {
        message: "Authentication successful".to_string(),
        user_id,
        scopes: scope.split_whitespace().map(String::from).collect(),
    }))
}

/// POST /auth/refresh
///
/// Exchanges the stored refresh token for a fresh access token. Keeps the
/// old refresh token when the provider does not rotate it.
async fn refresh(
    State(state): State<Arc<AuthAppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state
        .store
        .get_tokens(&request.user_id)
        .ok_or_else(|| AppError::NotFound("No tokens found for this user".to_string()))?;

    let refresh_token = record
        .refresh_token
        .ok_or_else(|| AppError::BadRequest("No refresh token available".to_string()))?;

    let tokens = exchange::refresh_tokens(&state.settings, &refresh_token)
        .await
        .map_err(|e| {
            warn!(user_id = %request.user_id, error = %e, "token refresh failed");
            AppError::BadGateway(format!("Failed to refresh token: {}", e))
        })?;

    let mut grant = tokens.to_grant();
    if grant.refresh_token.is_none() {
        grant.refresh_token = Some(refresh_token);
    }

    state
        .store
        .store_tokens(&request.user_id, &grant)
        .map_err(|e| AppError::ServerError(format!("Failed to store tokens: {}", e)))?;

    info!(user_id = %request.user_id, "access token refreshed");

    Ok(Json(serde_json::json!({
        "message": "Token refreshed successfully",
        "user_id": request.user_id,
    })))
}

/// POST /auth/logout
///
/// Drops the user's stored tokens. Provider-side revocation is out of
/// scope; the credentials simply stop being usable from here.
async fn logout(
    State(state): State<Arc<AuthAppState>>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state.store.delete_tokens(&request.user_id);

    if !deleted {
        return Err(AppError::NotFound(
            "No active session found for this user".to_string(),
        ));
    }

    info!(user_id = %request.user_id, "logged out");

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully",
        "user_id": request.user_id,
    })))
}

/// GET /auth/status/:user_id
async fn auth_status(
    State(state): State<Arc<AuthAppState>>,
    Path(user_id): Path<String>,
) -> Json<StatusResponse> {
    let Some(record) = state.store.get_tokens(&user_id) else {
        return Json(StatusResponse {
            authenticated: false,
            user_id,
            token_expired: None,
            has_refresh_token: None,
        });
    };

    let token_expired = state.store.is_token_expired(&user_id);

    Json(StatusResponse {
        authenticated: true,
        user_id,
        token_expired: Some(token_expired),
        has_refresh_token: Some(record.refresh_token.is_some()),
    })
}
