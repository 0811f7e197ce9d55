use crate::api::ErrorResponse;
use crate::session::CurrentSession;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

#[utoipa::path(
    delete,
    path = "/api/sessions/current",
    tag = "sessions",
    responses(
        (status = 204, description = "Session ended and its counter discarded"),
        (status = 401, description = "Missing or unknown session", body = ErrorResponse)
    ),
    security(("session_id" = []))
)]
pub async fn delete_current_session(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
) -> impl IntoResponse {
    state.sessions.remove(&session.id);
    tracing::info!(
        session_id = %session.id,
        query_count = session.counter.count(),
        "Session ended"
    );
    StatusCode::NO_CONTENT
}
