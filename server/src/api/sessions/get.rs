use crate::api::ErrorResponse;
use crate::session::CurrentSession;
use axum::{response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionStatusResponse {
    pub query_count: u32,
    pub query_limit: u32,
    pub remaining: u32,
    pub expires_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/sessions/current",
    tag = "sessions",
    responses(
        (status = 200, description = "Query usage for the current session", body = SessionStatusResponse),
        (status = 401, description = "Missing or unknown session", body = ErrorResponse)
    ),
    security(("session_id" = []))
)]
pub async fn get_current_session(CurrentSession(session): CurrentSession) -> impl IntoResponse {
    Json(SessionStatusResponse {
        query_count: session.counter.count(),
        query_limit: session.counter.limit(),
        remaining: session.counter.remaining(),
        expires_at: session.expires_at,
    })
}
