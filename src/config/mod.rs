//! # Configuration Module
//!
//! Preprocessing options, decode limits and scan/vision settings.

#[allow(clippy::module_inception)]
pub mod config;
pub mod options;

pub use config::{ScanConfig, VisionSettings};
pub use options::{DecodeLimits, PreprocessOptions, QUALITY_FLOOR_PERCENT, QUALITY_STEP_PERCENT};
