//! Fake inference client for testing.
//!
//! Returns a fixed response without network access or API costs, and records
//! what it was asked so tests can assert on dispatch.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::client::{InferenceClient, InferenceError};
use crate::request::{AnalysisRequest, AnalysisResponse};

/// Canned breakdown returned by [`FakeInferenceClient::default`].
pub const FAKE_ANALYSIS: &str = "* Total Calories: 650\n* Total Protein (grams): 32\n\nIndividual Items:\nItem 1 - Grilled chicken - Calories: 280, Protein (grams): 26, Carbohydrates (%): 0, Fat (%): 35\nItem 2 - Rice - Calories: 250, Protein (grams): 5, Carbohydrates (%): 90, Fat (%): 2\nItem 3 - Salad - Calories: 120, Protein (grams): 1, Carbohydrates (%): 30, Fat (%): 65\n\nCarbohydrates (%): 45\nProtein (%): 25\nFat (%): 30\n\nA balanced meal. Consider swapping white rice for brown rice.";

#[derive(Debug)]
enum Outcome {
    Text(String),
    Error(String),
}

/// What the fake saw on its most recent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub instruction: String,
    pub mime_type: String,
    pub image_len: usize,
}

#[derive(Debug)]
pub struct FakeInferenceClient {
    outcome: Outcome,
    calls: AtomicUsize,
    last_request: Mutex<Option<RecordedRequest>>,
}

impl Default for FakeInferenceClient {
    fn default() -> Self {
        Self::with_response(FAKE_ANALYSIS)
    }
}

impl FakeInferenceClient {
    /// A fake that answers every request with `text`.
    pub fn with_response(text: &str) -> Self {
        Self::from_outcome(Outcome::Text(text.to_string()))
    }

    /// A fake whose every call fails with a request error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self::from_outcome(Outcome::Error(message.to_string()))
    }

    fn from_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of times `generate` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl InferenceClient for FakeInferenceClient {
    async fn generate(
        &self,
        request: &AnalysisRequest<'_>,
    ) -> Result<AnalysisResponse, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(RecordedRequest {
            instruction: request.instruction().to_string(),
            mime_type: request.mime_type().to_string(),
            image_len: request.image_data().len(),
        });

        match &self.outcome {
            Outcome::Text(text) => Ok(AnalysisResponse {
                text: text.clone(),
                model: self.model_name().to_string(),
            }),
            Outcome::Error(message) => Err(InferenceError::RequestFailed(message.clone())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
