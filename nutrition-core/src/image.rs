//! Uploaded meal photos and MIME type handling.
//!
//! No decoding or resizing happens here. Bytes are forwarded to the model as-is;
//! the `image` crate is only used to sniff a format when the caller did not
//! declare one.

use image::ImageFormat;

/// MIME types the target model accepts for meal photos.
pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Maximum inline image size accepted by the generateContent API (20MB).
pub const MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// A photo as received from the user, before it is packaged into a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// The raw image bytes.
    pub data: Vec<u8>,
    /// The declared content type (e.g., "image/jpeg").
    pub mime_type: String,
}

impl UploadedImage {
    pub fn new(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Build an image whose MIME type is detected from its magic bytes.
    ///
    /// Returns `None` when the format cannot be recognized.
    pub fn detect(data: impl Into<Vec<u8>>) -> Option<Self> {
        let data = data.into();
        let mime_type = sniff_mime_type(&data)?;
        Some(Self {
            data,
            mime_type: mime_type.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Guess the MIME type of image bytes from their header.
pub fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    image::guess_format(data)
        .ok()
        .map(|format: ImageFormat| format.to_mime_type())
}

/// Normalize a declared MIME type to one the model accepts.
///
/// Browsers and older tools sometimes send `image/jpg`, which is folded into
/// `image/jpeg`. Returns `None` for anything outside [`SUPPORTED_MIME_TYPES`].
pub fn normalize_mime_type(mime_type: &str) -> Option<&'static str> {
    // Drop parameters such as "; charset=binary"
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        _ => None,
    }
}
