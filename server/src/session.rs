use crate::api::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use nutrition_core::Session;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the id returned by `POST /api/sessions`.
pub const SESSION_HEADER: &str = "x-session-id";

/// Extractor that resolves the `X-Session-Id` header to a live session.
///
/// ```ignore
/// async fn my_handler(CurrentSession(session): CurrentSession) -> impl IntoResponse {
///     // session.counter is this user's query counter
/// }
/// ```
pub struct CurrentSession(pub Arc<Session>);

pub enum SessionError {
    MissingHeader,
    InvalidHeader,
    UnknownSession,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message = match self {
            SessionError::MissingHeader => "Missing X-Session-Id header",
            SessionError::InvalidHeader => "Invalid X-Session-Id header",
            SessionError::UnknownSession => "Unknown or expired session",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(message)),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(SESSION_HEADER)
            .ok_or(SessionError::MissingHeader)?;

        let id = header
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or(SessionError::InvalidHeader)?;

        let session = state
            .sessions
            .get(&id)
            .ok_or(SessionError::UnknownSession)?;

        Ok(CurrentSession(session))
    }
}
