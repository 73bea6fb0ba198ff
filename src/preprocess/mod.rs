//! # Image Preprocessing
//!
//! Client-side preparation of fridge and shelf photos before they are sent to a
//! vision-language model. The pipeline:
//!
//! 1. **Decode** the source bytes (JPEG, PNG, WebP, ...) under decode limits
//! 2. **Scale to fit** `max_width` x `max_height` with one uniform ratio, never upscaling
//! 3. **Render** into an off-screen RGBA surface with bilinear resampling
//! 4. **Auto-enhance** (optional): three-bucket brightness, then a 1.1 contrast boost
//! 5. **Encode** as JPEG and step quality down by 0.1 to a 0.3 floor until the
//!    base64 payload fits `target_size_kb`
//!
//! The output is a [`ProcessedImage`]: base64 payload without a `data:` prefix,
//! final dimensions and payload size.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use fridge_scan::config::PreprocessOptions;
//! use fridge_scan::preprocess::{preprocess, SourceImage};
//!
//! let photo = image::RgbImage::from_pixel(400, 300, image::Rgb([90, 120, 60]));
//! let mut bytes = Cursor::new(Vec::new());
//! photo.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
//!
//! let source = SourceImage::from_bytes("fridge.png", bytes.into_inner());
//! let options = PreprocessOptions::new().max_width(200).max_height(200);
//! let processed = preprocess(&source, options).unwrap();
//!
//! assert_eq!((processed.width, processed.height), (200, 150));
//! assert!(!processed.base64.starts_with("data:"));
//! ```

pub mod decode;
pub mod encode;
pub mod enhance;
mod preprocessor;
mod types;

pub use preprocessor::Preprocessor;
pub use types::{JPEG_MIME_TYPE, ProcessedImage, SourceImage};

use crate::config::PreprocessOptions;
use crate::core::CancelToken;
use crate::error::PrepResult;

/// One-shot preprocessing with default decode limits and no cancellation.
pub fn preprocess(source: &SourceImage, options: PreprocessOptions) -> PrepResult<ProcessedImage> {
    Preprocessor::new(options)?.process(source, &CancelToken::new())
}
