//! Graph operation routes: email and calendar actions for an
//! authenticated user.
//!
//! Every handler resolves the caller's stored token first; an absent or
//! expired token is a 401 before anything touches the network.

use axum::{
    extract::State,
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::AppError;
use crate::credentials::TokenStore;
use crate::graph::{
    AvailabilityQuery, DraftMessage, GraphClient, MeetingRequest, SearchQuery, SendMail,
};

/// Shared state for the Graph API routes
#[derive(Clone)]
pub struct GraphAppState {
    pub store: Arc<TokenStore>,
}

/// Request to create a draft email
#[derive(Deserialize)]
pub struct DraftEmailRequest {
    user_id: String,
    #[serde(flatten)]
    draft: DraftMessage,
}

/// Request to send an email (existing draft or compose-and-send)
#[derive(Deserialize)]
pub struct SendEmailRequest {
    user_id: String,
    #[serde(flatten)]
    send: SendMail,
}

/// Request to search emails
#[derive(Deserialize)]
pub struct SearchEmailsRequest {
    user_id: String,
    #[serde(flatten)]
    search: SearchQuery,
}

/// Request to read one email
#[derive(Deserialize)]
pub struct ReadEmailRequest {
    user_id: String,
    message_id: String,
}

/// Request to check attendee availability
#[derive(Deserialize)]
pub struct AvailabilityRequest {
    user_id: String,
    #[serde(flatten)]
    query: AvailabilityQuery,
}

/// Request to schedule a meeting
#[derive(Deserialize)]
pub struct ScheduleMeetingRequest {
    user_id: String,
    #[serde(flatten)]
    meeting: MeetingRequest,
}

/// Create the Graph API router
pub fn create_graph_router(state: GraphAppState) -> Router {
    Router::new()
        .route("/graph/email/draft", post(create_draft_email))
        .route("/graph/email/send", post(send_email))
        .route("/graph/email/search", post(search_emails))
        .route("/graph/email/read", post(read_email))
        .route("/graph/calendar/availability", post(check_availability))
        .route("/graph/calendar/meeting", post(schedule_meeting))
        .with_state(Arc::new(state))
}

/// Resolves a usable access token for `user_id` into a Graph client.
///
/// Expired and absent are treated identically: the caller must refresh or
/// re-authenticate.
fn client_for_user(store: &TokenStore, user_id: &str) -> Result<GraphClient, AppError> {
    if store.is_token_expired(user_id) {
        return Err(AppError::Unauthorized(
            "Token expired or invalid. Please refresh or re-authenticate.".to_string(),
        ));
    }

    let record = store.get_tokens(user_id).ok_or_else(|| {
        AppError::Unauthorized("No valid authentication found for this user".to_string())
    })?;

    Ok(GraphClient::new(record.access_token))
}

/// POST /graph/email/draft
async fn create_draft_email(
    State(state): State<Arc<GraphAppState>>,
    Json(request): Json<DraftEmailRequest>,
) -> Result<Json<Value>, AppError> {
    let client = client_for_user(&state.store, &request.user_id)?;
    let result = client.create_draft(&request.draft).await?;

    Ok(Json(json!({
        "success": true,
        "draft_id": result["id"],
        "subject": result["subject"],
    })))
}

/// POST /graph/email/send
async fn send_email(
    State(state): State<Arc<GraphAppState>>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<Value>, AppError> {
    let client = client_for_user(&state.store, &request.user_id)?;
    client.send_email(&request.send).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Email sent successfully",
    })))
}

/// POST /graph/email/search
async fn search_emails(
    State(state): State<Arc<GraphAppState>>,
    Json(request): Json<SearchEmailsRequest>,
) -> Result<Json<Value>, AppError> {
    let client = client_for_user(&state.store, &request.user_id)?;
    let emails = client.search_emails(&request.search).await?;

    Ok(Json(json!({
        "success": true,
        "count": emails.len(),
        "emails": emails,
    })))
}

/// POST /graph/email/read
async fn read_email(
    State(state): State<Arc<GraphAppState>>,
    Json(request): Json<ReadEmailRequest>,
) -> Result<Json<Value>, AppError> {
    let client = client_for_user(&state.store, &request.user_id)?;
    let email = client.read_email(&request.message_id).await?;

    Ok(Json(json!({
        "success": true,
        "email": email,
    })))
}

/// POST /graph/calendar/availability
async fn check_availability(
    State(state): State<Arc<GraphAppState>>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let client = client_for_user(&state.store, &request.user_id)?;
    let availability = client.check_availability(&request.query).await?;

    Ok(Json(json!({
        "success": true,
        "availability": availability,
    })))
}

/// POST /graph/calendar/meeting
async fn schedule_meeting(
    State(state): State<Arc<GraphAppState>>,
    Json(request): Json<ScheduleMeetingRequest>,
) -> Result<Json<Value>, AppError> {
    let client = client_for_user(&state.store, &request.user_id)?;
    let meeting = client.schedule_meeting(&request.meeting).await?;

    Ok(Json(json!({
        "success": true,
        "meeting_id": meeting["id"],
        "subject": meeting["subject"],
        "online_meeting_url": meeting["onlineMeeting"]["joinUrl"],
    })))
}
