//! Preprocessing options and decode limits.
//!
//! [`PreprocessOptions`] mirrors the knobs of the upload pipeline: output
//! bounds, starting JPEG quality, auto-enhancement and the payload size
//! target. [`DecodeLimits`] caps what the decoder is allowed to allocate.

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, PrepResult};

/// Lowest JPEG quality the size search will accept, in percent.
pub const QUALITY_FLOOR_PERCENT: u8 = 30;

/// Quality decrement per re-encode, in percent.
pub const QUALITY_STEP_PERCENT: u8 = 10;

/// Configuration options for image preprocessing.
///
/// # Defaults
///
/// - Max output: 1920x1080
/// - Starting quality: 0.85
/// - Auto-enhance: enabled
/// - Target payload: 500 KB
///
/// # Example
///
/// ```
/// use fridge_scan::config::PreprocessOptions;
///
/// let options = PreprocessOptions::new()
///     .max_width(1500)
///     .target_size_kb(300);
///
/// assert_eq!(options.max_height, 1080);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Upper bound on output width in pixels.
    #[serde(alias = "maxWidth")]
    pub max_width: u32,

    /// Upper bound on output height in pixels.
    #[serde(alias = "maxHeight")]
    pub max_height: u32,

    /// Initial JPEG quality in (0, 1].
    pub quality: f32,

    /// Whether the brightness/contrast pass runs.
    #[serde(alias = "autoEnhance")]
    pub auto_enhance: bool,

    /// Desired upper bound on the base64 payload size, in KB.
    #[serde(alias = "targetSizeKB", alias = "targetSizeKb")]
    pub target_size_kb: u32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: 0.85,
            auto_enhance: true,
            target_size_kb: 500,
        }
    }
}

impl PreprocessOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn max_width(mut self, width: u32) -> Self {
        self.max_width = width;
        self
    }

    #[inline]
    pub fn max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    #[inline]
    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    #[inline]
    pub fn auto_enhance(mut self, enabled: bool) -> Self {
        self.auto_enhance = enabled;
        self
    }

    #[inline]
    pub fn target_size_kb(mut self, kb: u32) -> Self {
        self.target_size_kb = kb;
        self
    }

    /// Starting quality as an encoder percentage (1..=100).
    pub fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Validates the option values.
    pub fn validate(&self) -> PrepResult<()> {
        if self.max_width == 0 {
            return Err(PrepError::config("max_width", "0", "must be greater than 0"));
        }
        if self.max_height == 0 {
            return Err(PrepError::config("max_height", "0", "must be greater than 0"));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(PrepError::config(
                "quality",
                self.quality.to_string(),
                "must be in (0, 1]",
            ));
        }
        if self.target_size_kb == 0 {
            return Err(PrepError::config(
                "target_size_kb",
                "0",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Caps applied while decoding untrusted photos.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// Largest accepted source width in pixels.
    pub max_source_width: u32,
    /// Largest accepted source height in pixels.
    pub max_source_height: u32,
    /// Largest allocation the decoder may make, in bytes.
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_source_width: 16_384,
            max_source_height: 16_384,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    pub(crate) fn to_image_limits(self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.max_source_width);
        limits.max_image_height = Some(self.max_source_height);
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let opts = PreprocessOptions::default();
        assert_eq!(opts.max_width, 1920);
        assert_eq!(opts.max_height, 1080);
        assert!((opts.quality - 0.85).abs() < f32::EPSILON);
        assert!(opts.auto_enhance);
        assert_eq!(opts.target_size_kb, 500);
        assert_eq!(opts.quality_percent(), 85);
    }

    #[test]
    fn test_builder_chaining() {
        let opts = PreprocessOptions::new()
            .max_width(1500)
            .max_height(900)
            .quality(0.92)
            .auto_enhance(false)
            .target_size_kb(250);

        assert_eq!(opts.max_width, 1500);
        assert_eq!(opts.max_height, 900);
        assert_eq!(opts.quality_percent(), 92);
        assert!(!opts.auto_enhance);
        assert_eq!(opts.target_size_kb, 250);
    }

    #[test]
    fn test_validation() {
        assert!(PreprocessOptions::new().validate().is_ok());
        assert!(PreprocessOptions::new().max_width(0).validate().is_err());
        assert!(PreprocessOptions::new().max_height(0).validate().is_err());
        assert!(PreprocessOptions::new().quality(0.0).validate().is_err());
        assert!(PreprocessOptions::new().quality(1.2).validate().is_err());
        assert!(PreprocessOptions::new().quality(f32::NAN).validate().is_err());
        assert!(PreprocessOptions::new().quality(1.0).validate().is_ok());
        assert!(PreprocessOptions::new().target_size_kb(0).validate().is_err());
    }

    #[test]
    fn test_deserialize_accepts_camel_case_names() {
        let opts: PreprocessOptions =
            serde_json::from_str(r#"{"maxWidth": 1500, "targetSizeKB": 400}"#).unwrap();
        assert_eq!(opts.max_width, 1500);
        assert_eq!(opts.target_size_kb, 400);
        assert_eq!(opts.max_height, 1080);
        assert!(opts.auto_enhance);
    }

    #[test]
    fn test_decode_limits_map_to_image_limits() {
        let limits = DecodeLimits::default().to_image_limits();
        assert_eq!(limits.max_image_width, Some(16_384));
        assert_eq!(limits.max_alloc, Some(512 * 1024 * 1024));
    }
}
