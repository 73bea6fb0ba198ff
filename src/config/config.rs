//! # Scan Configuration
//!
//! Configuration shared by the CLI and library callers: preprocessing
//! options, decode limits and the vision-model settings. It can be built in
//! code or loaded from a JSON file; every field has a default, so a file only
//! needs the values it changes.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "preprocess": { "max_width": 1500, "target_size_kb": 500 },
//!   "limits": { "max_source_width": 12000 },
//!   "vision": { "model": "gemini-1.5-flash", "timeout_secs": 60 }
//! }
//! ```
//!
//! ## Parameters
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | `preprocess.max_width` | 1920 | Output width bound |
//! | `preprocess.max_height` | 1080 | Output height bound |
//! | `preprocess.quality` | 0.85 | Starting JPEG quality |
//! | `preprocess.auto_enhance` | true | Brightness/contrast pass |
//! | `preprocess.target_size_kb` | 500 | Payload size target |
//! | `vision.model` | gemini-1.5-flash | Model name |
//! | `vision.endpoint` | Gemini v1beta | API base URL |
//! | `vision.api_key_env` | GEMINI_API_KEY | Env var holding the key |
//! | `vision.timeout_secs` | 60 | Request timeout |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::options::{DecodeLimits, PreprocessOptions};
use crate::error::{PrepError, PrepResult};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Settings for the downstream vision-model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub model: String,
    pub endpoint: String,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 60,
        }
    }
}

impl VisionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.model.trim().is_empty() {
            return Err(PrepError::config("vision.model", "\"\"", "must not be empty"));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(PrepError::config(
                "vision.endpoint",
                &self.endpoint,
                "must be an http(s) URL",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(PrepError::config(
                "vision.timeout_secs",
                "0",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Complete configuration for a scan run.
///
/// # Examples
///
/// ```rust
/// use fridge_scan::config::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert_eq!(config.preprocess.max_width, 1920);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub preprocess: PreprocessOptions,
    pub limits: DecodeLimits,
    pub vision: VisionSettings,
}

impl ScanConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> PrepResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| PrepError::config("config", "<json>", e.to_string()))
    }

    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> PrepResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PrepError::io_at("reading config", path, e))?;
        let config = Self::from_json(&text)
            .map_err(|e| e.with_context(format!("config file {}", path.display())))?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded scan configuration");
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> PrepResult<()> {
        self.preprocess.validate()?;
        if self.limits.max_source_width == 0 || self.limits.max_source_height == 0 {
            return Err(PrepError::config(
                "limits",
                format!(
                    "{}x{}",
                    self.limits.max_source_width, self.limits.max_source_height
                ),
                "source limits must be greater than 0",
            ));
        }
        self.vision.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.preprocess, PreprocessOptions::default());
        assert_eq!(config.vision.model, "gemini-1.5-flash");
        assert_eq!(config.vision.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.vision.timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScanConfig::from_json(
            r#"{"preprocess": {"max_width": 1500}, "vision": {"model": "gemini-2.0-flash"}}"#,
        )
        .unwrap();
        assert_eq!(config.preprocess.max_width, 1500);
        assert_eq!(config.preprocess.max_height, 1080);
        assert_eq!(config.vision.model, "gemini-2.0-flash");
        assert_eq!(config.vision.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScanConfig::default();
        assert!(config.validate().is_ok());

        config.vision.endpoint = "ftp://example".to_string();
        assert!(config.validate().is_err());
        config.vision.endpoint = DEFAULT_ENDPOINT.to_string();

        config.vision.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.vision.timeout_secs = 30;

        config.limits.max_source_width = 0;
        assert!(config.validate().is_err());
        config.limits.max_source_width = 100;

        config.preprocess.quality = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"preprocess": {{"targetSizeKB": 250, "autoEnhance": false}}}}"#).unwrap();

        let config = ScanConfig::load(file.path()).unwrap();
        assert_eq!(config.preprocess.target_size_kb, 250);
        assert!(!config.preprocess.auto_enhance);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"preprocess": {{"quality": 3.0}}}}"#).unwrap();

        let err = ScanConfig::load(file.path()).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ScanConfig::load("/nonexistent/fridge-scan.json").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
