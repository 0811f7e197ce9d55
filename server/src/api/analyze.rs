use crate::api::{AnalysisFailure, ErrorResponse};
use crate::session::CurrentSession;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use nutrition_core::image::sniff_mime_type;
use nutrition_core::{UploadedImage, MAX_FILE_SIZE};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Multipart field holding the meal photo.
const FILE_FIELD: &str = "file";

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    /// Model output, exactly as returned.
    pub analysis: String,
    pub model: String,
    pub query_count: u32,
    pub query_limit: u32,
    pub remaining: u32,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct AnalyzeRequest {
    /// JPEG or PNG photo of a meal
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Returns the router for /api/analyze (mounted at /api/analyze)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(analyze))
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + MULTIPART_OVERHEAD))
}

#[derive(OpenApi)]
#[openapi(paths(analyze), components(schemas(AnalyzeRequest, AnalyzeResponse)))]
pub struct ApiDoc;

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Response {
    tracing::warn!("Multipart read error: {}", e);
    let error_msg = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        format!("File too large. Maximum size is {} bytes", MAX_FILE_SIZE)
    } else {
        format!("Failed to read multipart data: {}", e.body_text())
    };
    (e.status(), Json(ErrorResponse::new(error_msg))).into_response()
}

/// Pick the MIME type for an upload.
///
/// A declared image type is kept as-is so unsupported formats are reported
/// by name. Missing or generic declarations fall back to the file header.
fn resolve_mime_type(declared: Option<&str>, data: &[u8]) -> String {
    match declared {
        Some(declared) if !declared.is_empty() && declared != "application/octet-stream" => {
            declared.to_string()
        }
        _ => sniff_mime_type(data)
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// Read the `file` field, if the form has a non-empty one.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<UploadedImage>, Response> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let declared = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        if data.is_empty() {
            return Ok(None);
        }

        let mime_type = resolve_mime_type(declared.as_deref(), &data);
        return Ok(Some(UploadedImage::new(data.to_vec(), mime_type)));
    }

    Ok(None)
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    tag = "analyze",
    request_body(content_type = "multipart/form-data", content = AnalyzeRequest),
    responses(
        (status = 200, description = "Nutrition analysis of the uploaded meal", body = AnalyzeResponse),
        (status = 400, description = "No image was uploaded", body = ErrorResponse),
        (status = 401, description = "Missing or unknown session", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse),
        (status = 415, description = "Unsupported image type", body = ErrorResponse),
        (status = 429, description = "Session query limit reached", body = ErrorResponse),
        (status = 502, description = "Inference service failed", body = ErrorResponse)
    ),
    security(
        ("session_id" = [])
    )
)]
pub async fn analyze(
    CurrentSession(session): CurrentSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let image = match read_upload(&mut multipart).await {
        Ok(image) => image,
        Err(response) => return response,
    };

    match state.analyzer.analyze(&session.counter, image.as_ref()).await {
        Ok(response) => Json(AnalyzeResponse {
            analysis: response.text,
            model: response.model,
            query_count: session.counter.count(),
            query_limit: session.counter.limit(),
            remaining: session.counter.remaining(),
        })
        .into_response(),
        Err(e) => AnalysisFailure(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_declared_type_is_kept() {
        assert_eq!(resolve_mime_type(Some("image/jpg"), PNG_HEADER), "image/jpg");
        assert_eq!(resolve_mime_type(Some("image/gif"), PNG_HEADER), "image/gif");
    }

    #[test]
    fn test_generic_type_is_sniffed() {
        assert_eq!(resolve_mime_type(None, PNG_HEADER), "image/png");
        assert_eq!(
            resolve_mime_type(Some("application/octet-stream"), PNG_HEADER),
            "image/png"
        );
        assert_eq!(
            resolve_mime_type(None, b"plain text"),
            "application/octet-stream"
        );
    }
}
