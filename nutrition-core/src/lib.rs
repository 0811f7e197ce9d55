pub mod ai;
pub mod analyze;
pub mod error;
pub mod image;
pub mod request;
pub mod session;

pub use ai::{
    create_client, create_client_from_env, AiConfig, ConfigError, FakeInferenceClient,
    GeminiClient, InferenceClient, InferenceError,
};
pub use analyze::MealAnalyzer;
pub use error::AnalysisError;
pub use image::{normalize_mime_type, UploadedImage, MAX_FILE_SIZE, SUPPORTED_MIME_TYPES};
pub use request::{build_request, AnalysisRequest, AnalysisResponse};
pub use session::{QueryCounter, QueryPermit, Session, SessionConfig, SessionStore};
