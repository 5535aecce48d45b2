//! Service banner and health check.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::config::Settings;

/// Create the root and health-check router
pub fn create_health_router(settings: Arc<Settings>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(settings)
}

/// GET /
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "graphgate",
        "message": "Outlook mail and calendar actions via Microsoft Graph",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health
///
/// 503 with the list of missing required settings when the Azure AD
/// application is not configured, 200 otherwise.
async fn health(State(settings): State<Arc<Settings>>) -> Response {
    let missing = settings.missing_required();

    if !missing.is_empty() {
        let body = Json(json!({
            "status": "unhealthy",
            "message": format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ),
            "missing_vars": missing,
        }));
        return (StatusCode::SERVICE_UNAVAILABLE, body).into_response();
    }

    Json(json!({
        "status": "healthy",
        "message": "Service is running",
        "environment": {
            "client_id_set": !settings.client_id.is_empty(),
            "tenant_id_set": !settings.tenant_id.is_empty(),
            "redirect_uri_set": !settings.redirect_uri.is_empty(),
        },
    }))
    .into_response()
}
