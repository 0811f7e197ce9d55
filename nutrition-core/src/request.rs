//! Request builder: pairs the instruction text with an uploaded image.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::image::{normalize_mime_type, UploadedImage, MAX_FILE_SIZE};

/// One analysis request, ready for submission to an [`InferenceClient`].
///
/// Borrows both parts from the caller and cannot be modified after
/// [`build_request`] returns it.
///
/// [`InferenceClient`]: crate::ai::InferenceClient
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    instruction: &'a str,
    image: &'a [u8],
    mime_type: &'static str,
}

impl<'a> AnalysisRequest<'a> {
    /// The instruction text sent ahead of the image.
    pub fn instruction(&self) -> &'a str {
        self.instruction
    }

    /// The raw image bytes.
    pub fn image_data(&self) -> &'a [u8] {
        self.image
    }

    /// The normalized MIME type of the image.
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }
}

/// Text returned by the model. Never parsed or reformatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub text: String,
    /// Model identifier used for the call.
    pub model: String,
}

/// Validate an uploaded image and package it with the instruction.
///
/// Fails with [`AnalysisError::MissingInput`] when no image (or an empty one)
/// was supplied; callers must not dispatch anything in that case.
pub fn build_request<'a>(
    instruction: &'a str,
    image: Option<&'a UploadedImage>,
) -> Result<AnalysisRequest<'a>, AnalysisError> {
    let image = match image {
        Some(image) if !image.is_empty() => image,
        _ => return Err(AnalysisError::MissingInput),
    };

    let mime_type = normalize_mime_type(&image.mime_type)
        .ok_or_else(|| AnalysisError::UnsupportedMimeType(image.mime_type.clone()))?;

    if image.len() > MAX_FILE_SIZE {
        return Err(AnalysisError::ImageTooLarge {
            size: image.len(),
            max: MAX_FILE_SIZE,
        });
    }

    Ok(AnalysisRequest {
        instruction,
        image: &image.data,
        mime_type,
    })
}
