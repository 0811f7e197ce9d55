//! Inference client module for the hosted multimodal model.
//!
//! This module provides:
//! - `InferenceClient` trait for abstracting model providers
//! - `GeminiClient` calling Google's generateContent API
//! - `FakeInferenceClient` for tests and offline runs
//! - Configuration via environment variables
//! - The nutrition instruction prompt
//!
//! # Configuration
//!
//! Set these environment variables:
//!
//! - `GOOGLE_API_KEY` (required for the gemini provider): Your Gemini API key
//! - `NUTRITION_AI_PROVIDER` (optional): "gemini" or "fake"
//! - `NUTRITION_AI_MODEL` (optional): Model name, e.g., "gemini-2.0-flash-001"
//! - `NUTRITION_AI_BASE_URL` (optional): API base URL
//! - `NUTRITION_PROMPT_FILE` (optional): File holding a replacement instruction
//!
//! # Example
//!
//! ```ignore
//! use nutrition_core::{build_request, create_client_from_env, UploadedImage};
//!
//! let (client, config) = create_client_from_env()?;
//! let image = UploadedImage::detect(std::fs::read("lunch.jpg")?).unwrap();
//! let request = build_request(&config.instruction, Some(&image))?;
//! let response = client.generate(&request).await?;
//! println!("{}", response.text);
//! ```

mod client;
mod config;
mod fake;
mod gemini;
pub mod prompts;
mod types;

pub use client::{create_client, create_client_from_env, InferenceClient, InferenceError};
pub use config::{AiConfig, ConfigError, Provider, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use fake::{FakeInferenceClient, RecordedRequest, FAKE_ANALYSIS};
pub use gemini::GeminiClient;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
    PromptFeedback,
};
