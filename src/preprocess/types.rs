//! Input and output records of the preprocessing pipeline.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;

use crate::error::{PrepError, PrepResult};

/// MIME type of every payload the pipeline produces.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Encoded image bytes as captured or picked by the user.
///
/// The format is whatever the decoder recognizes from the bytes; the label is
/// only used for logs and error messages.
#[derive(Debug, Clone)]
pub struct SourceImage {
    label: String,
    bytes: Vec<u8>,
}

impl SourceImage {
    pub fn from_bytes(label: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a photo from disk, labelled with its file name.
    pub fn from_path(path: impl AsRef<Path>) -> PrepResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).map_err(|e| PrepError::io_at("reading image", path, e))?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { label, bytes })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A size- and dimension-bounded JPEG ready for upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    /// Base64 JPEG payload without a `data:` prefix.
    pub base64: String,
    pub width: u32,
    pub height: u32,
    /// Size of the base64 payload in KB, rounded.
    #[serde(rename = "sizeKB")]
    pub size_kb: u32,
    /// Final JPEG quality used, as a fraction.
    pub quality: f32,
    /// Number of re-encodes performed by the size search.
    pub iterations: u32,
}

impl ProcessedImage {
    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME_TYPE
    }

    /// Raw JPEG bytes behind the payload.
    pub fn jpeg_bytes(&self) -> PrepResult<Vec<u8>> {
        general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(|e| PrepError::encode("<processed>", e.to_string()))
    }
}
