pub mod analyze;
pub mod sessions;
pub mod testing;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nutrition_core::AnalysisError;
use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// True when the user can fix the problem (no image, limit reached).
    pub warning: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            warning: false,
        }
    }

    pub fn warning(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            warning: true,
        }
    }
}

/// An [`AnalysisError`] rendered as an HTTP response.
pub struct AnalysisFailure(pub AnalysisError);

impl AnalysisFailure {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AnalysisError::MissingInput => StatusCode::BAD_REQUEST,
            AnalysisError::UnsupportedMimeType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AnalysisError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AnalysisError::LimitReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<AnalysisError> for AnalysisFailure {
    fn from(err: AnalysisError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AnalysisFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if self.0.is_warning() {
            ErrorResponse::warning(self.0.to_string())
        } else {
            ErrorResponse::new(self.0.to_string())
        };
        (status, Json(body)).into_response()
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(components(schemas(ErrorResponse)))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "session_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-Id"))),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        testing::ApiDoc::openapi(),
        sessions::ApiDoc::openapi(),
        analyze::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.merge(module_spec);
    }

    spec
}
