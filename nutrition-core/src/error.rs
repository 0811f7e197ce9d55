use thiserror::Error;

use crate::ai::InferenceError;

/// Errors produced by one pass through the analysis cycle.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Please upload an image of a meal.")]
    MissingInput,

    #[error("Unsupported image type: {0}. Allowed: image/jpeg, image/png")]
    UnsupportedMimeType(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("You have reached the limit of {limit} queries. Please try again later.")]
    LimitReached { limit: u32 },

    #[error("Analysis failed: {0}")]
    ExternalService(#[from] InferenceError),
}

impl AnalysisError {
    /// True for refusals the user can fix themselves (shown as a warning banner).
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingInput | AnalysisError::LimitReached { .. }
        )
    }
}
