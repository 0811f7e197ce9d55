use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::config::{AiConfig, ConfigError, Provider};
use super::fake::FakeInferenceClient;
use super::gemini::GeminiClient;
use crate::request::{AnalysisRequest, AnalysisResponse};

/// Error type for inference calls. Surfaced to the user as-is.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Model returned no text: {0}")]
    EmptyResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for inference clients.
///
/// One call to `generate` is one outbound request to the hosted model. Implementations
/// must not retry; whatever the service reports is returned to the caller.
#[async_trait]
pub trait InferenceClient: Send + Sync + fmt::Debug {
    /// Submit a request and wait for the complete response text.
    async fn generate(
        &self,
        request: &AnalysisRequest<'_>,
    ) -> Result<AnalysisResponse, InferenceError>;

    /// Get the provider name (e.g., "gemini", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name (e.g., "gemini-2.0-flash-001").
    fn model_name(&self) -> &str;
}

/// Build the client selected by `config.provider`.
pub fn create_client(config: &AiConfig) -> Result<Arc<dyn InferenceClient>, InferenceError> {
    match config.provider {
        Provider::Gemini => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                InferenceError::NotConfigured("GOOGLE_API_KEY not set".to_string())
            })?;
            Ok(Arc::new(GeminiClient::new(
                api_key,
                config.model.clone(),
                config.base_url.clone(),
            )))
        }
        Provider::Fake => Ok(Arc::new(FakeInferenceClient::default())),
    }
}

/// Load [`AiConfig`] from the environment and build its client.
///
/// Meant to be called once at startup so a missing credential aborts the
/// process instead of failing the first request.
pub fn create_client_from_env() -> Result<(Arc<dyn InferenceClient>, AiConfig), ConfigError> {
    let config = AiConfig::from_env()?;
    let client = create_client(&config)
        .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_API_KEY".to_string()))?;

    tracing::info!(
        provider = client.provider_name(),
        model = client.model_name(),
        "Inference client configured"
    );

    Ok((client, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompts::DEFAULT_NUTRITION_PROMPT;

    fn config(provider: Provider, api_key: Option<&str>) -> AiConfig {
        AiConfig {
            provider,
            api_key: api_key.map(str::to_string),
            model: "gemini-2.0-flash-001".to_string(),
            base_url: "http://localhost".to_string(),
            instruction: DEFAULT_NUTRITION_PROMPT.to_string(),
        }
    }

    #[test]
    fn test_create_gemini_client() {
        let client = create_client(&config(Provider::Gemini, Some("key"))).unwrap();
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model_name(), "gemini-2.0-flash-001");
    }

    #[test]
    fn test_create_gemini_client_without_key() {
        let err = create_client(&config(Provider::Gemini, None)).unwrap_err();
        assert!(matches!(err, InferenceError::NotConfigured(_)));
    }

    #[test]
    fn test_create_fake_client() {
        let client = create_client(&config(Provider::Fake, None)).unwrap();
        assert_eq!(client.provider_name(), "fake");
    }
}
