use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    /// Send this back in the X-Session-Id header
    pub session_id: Uuid,
    pub query_limit: u32,
    pub expires_at: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session started with a fresh query counter", body = CreateSessionResponse)
    )
)]
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.sessions.create();

    tracing::info!(
        session_id = %session.id,
        expires_at = %session.expires_at,
        "Session started"
    );

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id,
            query_limit: session.counter.limit(),
            expires_at: session.expires_at,
        }),
    )
}
