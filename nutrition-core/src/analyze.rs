//! The full submit cycle: validate, authorize, dispatch, record.

use std::sync::Arc;

use crate::ai::prompts::{DEFAULT_NUTRITION_PROMPT, NUTRITION_PROMPT_NAME};
use crate::ai::{AiConfig, InferenceClient};
use crate::error::AnalysisError;
use crate::image::UploadedImage;
use crate::request::{build_request, AnalysisResponse};
use crate::session::QueryCounter;

/// Runs meal photos through an inference client with a fixed instruction.
#[derive(Debug, Clone)]
pub struct MealAnalyzer {
    client: Arc<dyn InferenceClient>,
    instruction: String,
}

impl MealAnalyzer {
    pub fn new(client: Arc<dyn InferenceClient>, instruction: impl Into<String>) -> Self {
        Self {
            client,
            instruction: instruction.into(),
        }
    }

    /// Analyzer using [`DEFAULT_NUTRITION_PROMPT`].
    pub fn with_default_prompt(client: Arc<dyn InferenceClient>) -> Self {
        Self::new(client, DEFAULT_NUTRITION_PROMPT)
    }

    /// Analyzer using the instruction from `config`.
    pub fn from_config(client: Arc<dyn InferenceClient>, config: &AiConfig) -> Self {
        Self::new(client, config.instruction.clone())
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Analyze one uploaded image on behalf of the session owning `counter`.
    ///
    /// Nothing is dispatched when the image is missing or invalid, or when the
    /// session has used up its queries. A failed call is not counted.
    pub async fn analyze(
        &self,
        counter: &QueryCounter,
        image: Option<&UploadedImage>,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let request = build_request(&self.instruction, image).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected analysis request");
        })?;

        let permit = counter.try_acquire().inspect_err(|_| {
            tracing::warn!(
                limit = counter.limit(),
                count = counter.count(),
                "Query limit reached, not dispatching"
            );
        })?;

        let response = self.client.generate(&request).await.map_err(|e| {
            tracing::error!(
                prompt_name = NUTRITION_PROMPT_NAME,
                provider = self.client.provider_name(),
                error = %e,
                "Inference call failed"
            );
            AnalysisError::ExternalService(e)
        })?;

        let count = permit.commit();
        tracing::info!(
            prompt_name = NUTRITION_PROMPT_NAME,
            model = %response.model,
            count,
            remaining = counter.remaining(),
            "Meal analyzed"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::FakeInferenceClient;

    fn analyzer(fake: &Arc<FakeInferenceClient>) -> MealAnalyzer {
        MealAnalyzer::new(fake.clone(), "Analyze this meal")
    }

    #[tokio::test]
    async fn test_missing_image_not_dispatched() {
        let fake = Arc::new(FakeInferenceClient::default());
        let counter = QueryCounter::default();

        let err = analyzer(&fake).analyze(&counter, None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput));
        assert_eq!(fake.calls(), 0);
        assert_eq!(counter.count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_type_not_dispatched() {
        let fake = Arc::new(FakeInferenceClient::default());
        let counter = QueryCounter::default();
        let image = UploadedImage::new(vec![1, 2, 3], "image/gif");

        let err = analyzer(&fake)
            .analyze(&counter, Some(&image))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedMimeType(_)));
        assert_eq!(fake.calls(), 0);
        assert_eq!(counter.remaining(), 5);
    }

    #[tokio::test]
    async fn test_failed_call_not_counted() {
        let fake = Arc::new(FakeInferenceClient::failing("network unreachable"));
        let counter = QueryCounter::default();
        let image = UploadedImage::new(vec![1, 2, 3], "image/png");

        let err = analyzer(&fake)
            .analyze(&counter, Some(&image))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ExternalService(_)));
        assert!(err.to_string().contains("network unreachable"));
        assert_eq!(fake.calls(), 1);
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.remaining(), 5);
    }

    #[tokio::test]
    async fn test_instruction_forwarded() {
        let fake = Arc::new(FakeInferenceClient::default());
        let analyzer = MealAnalyzer::with_default_prompt(fake.clone());
        let image = UploadedImage::new(vec![1, 2, 3], "image/jpg");

        analyzer
            .analyze(&QueryCounter::default(), Some(&image))
            .await
            .unwrap();

        let recorded = fake.last_request().unwrap();
        assert_eq!(recorded.instruction, DEFAULT_NUTRITION_PROMPT);
        assert_eq!(recorded.mime_type, "image/jpeg");
        assert_eq!(analyzer.model_name(), "fake-model");
    }
}
