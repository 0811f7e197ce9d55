pub mod create;
pub mod delete;
pub mod get;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/sessions endpoints (mounted at /api/sessions)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create::create_session))
        .route(
            "/current",
            get(get::get_current_session).delete(delete::delete_current_session),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_session,
        get::get_current_session,
        delete::delete_current_session
    ),
    components(schemas(create::CreateSessionResponse, get::SessionStatusResponse))
)]
pub struct ApiDoc;
