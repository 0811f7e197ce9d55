//! Google Gemini provider using the REST generateContent endpoint.

use async_trait::async_trait;
use base64::prelude::*;
use std::time::Instant;

use super::client::{InferenceClient, InferenceError};
use super::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
};
use crate::request::{AnalysisRequest, AnalysisResponse};

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new GeminiClient. No request timeout is set; a call waits for
    /// the complete response.
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body: the instruction first, then the inline image.
    pub fn request_body(request: &AnalysisRequest<'_>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::Text {
                        text: request.instruction().to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.mime_type().to_string(),
                            data: BASE64_STANDARD.encode(request.image_data()),
                        },
                    },
                ],
            }],
        }
    }

    /// Turn a raw HTTP status and body into the response text or an error.
    pub fn parse_response(status: u16, body: &str) -> Result<String, InferenceError> {
        if !(200..300).contains(&status) {
            if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
                let message = match envelope.error.status {
                    Some(code) => format!("{}: {}", code, envelope.error.message),
                    None => envelope.error.message,
                };
                return Err(InferenceError::ApiError { status, message });
            }
            return Err(InferenceError::ApiError {
                status,
                message: body.to_string(),
            });
        }

        let response: GenerateContentResponse =
            serde_json::from_str(body).map_err(|e| InferenceError::ParseError(e.to_string()))?;

        response
            .text()
            .ok_or_else(|| InferenceError::EmptyResponse(response.empty_reason()))
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate(
        &self,
        request: &AnalysisRequest<'_>,
    ) -> Result<AnalysisResponse, InferenceError> {
        let body = Self::request_body(request);

        tracing::debug!(
            model = %self.model,
            mime_type = request.mime_type(),
            image_bytes = request.image_data().len(),
            "Calling Gemini API"
        );
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::RequestFailed(e.to_string()))?;

        tracing::debug!(
            model = %self.model,
            status,
            latency_ms = started.elapsed().as_millis() as u64,
            "Gemini API responded"
        );

        let text = Self::parse_response(status, &body)?;

        Ok(AnalysisResponse {
            text,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
