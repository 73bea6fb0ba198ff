//! # Fridge Scan Library
//!
//! Prepares fridge and shelf photos for a vision-language model: decode,
//! scale to fit a bounding box, auto-enhance, then search JPEG quality until
//! the base64 payload fits a size target.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `preprocess`: The per-image pipeline and its building blocks
//! - `scan`: Async, batch and scan-and-analyze entry points
//! - `vision`: Gemini `generateContent` request types and client
//! - `core`: Render surface pool and cancellation
//! - `config`: Options, decode limits and vision settings
//! - `error`: Error type and classification traits
//!
//! Scale planning and resampling live in the `scan-scale` workspace crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fridge_scan::{preprocess, PreprocessOptions, SourceImage};
//!
//! # fn main() -> Result<(), fridge_scan::PrepError> {
//! let source = SourceImage::from_path("fridge.jpg")?;
//! let processed = preprocess(&source, PreprocessOptions::default())?;
//! println!(
//!     "{}x{} at quality {:.2}: {} KB",
//!     processed.width, processed.height, processed.quality, processed.size_kb
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod preprocess;
pub mod scan;
pub mod vision;

/// Re-export error types for convenience
pub use error::{
    ErrorSeverity, HasRecoverySuggestion, HasSeverity, PrepError, PrepResult, Retryable,
};

pub use config::{DecodeLimits, PreprocessOptions, ScanConfig, VisionSettings};
pub use core::CancelToken;
pub use preprocess::{ProcessedImage, Preprocessor, SourceImage, preprocess};
pub use scan::{ScanOutcome, preprocess_async, preprocess_batch, scan_and_analyze};
pub use vision::{GeminiClient, VisionModel};
