// HTTP API routers: auth flow, Graph operations, health

pub mod graph;
pub mod health;
pub mod oauth;

pub use graph::{create_graph_router, GraphAppState};
pub use health::create_health_router;
pub use oauth::{create_auth_router, AuthAppState};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::graph::GraphError;

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Application error types for API endpoints
pub(crate) enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    RateLimited(String),
    ServerError(String),
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::ServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::TokenExpired => AppError::Unauthorized(
                "Access token expired. Please refresh the token.".to_string(),
            ),
            GraphError::InvalidRequest(msg) => AppError::BadRequest(msg),
            GraphError::RateLimited { retry_after } => AppError::RateLimited(format!(
                "Rate limit exceeded. Retry after {} seconds",
                retry_after
            )),
            GraphError::Api { status, message } => {
                AppError::BadGateway(format!("Graph API error {}: {}", status, message))
            }
            GraphError::Server(msg) | GraphError::Network(msg) => AppError::BadGateway(msg),
        }
    }
}
