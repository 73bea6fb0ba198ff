//! # Error Handling
//!
//! Error type for the preprocessing library, with error classification traits
//! and per-error context.
//!
//! ## Architecture
//!
//! - **PrepError**: one variant per failure kind. The preprocessing core only
//!   ever produces [`PrepError::Decode`], [`PrepError::Render`],
//!   [`PrepError::Encode`] and [`PrepError::Cancelled`]; the remaining variants
//!   belong to the configuration, CLI and vision-request layers.
//! - **ErrorContext**: operation, free-form context, recovery suggestion,
//!   severity and key/value metadata attached to every variant.
//! - **Traits**: [`Retryable`], [`HasSeverity`] and [`HasRecoverySuggestion`]
//!   let callers decide what to do with a failed image or request.
//!
//! ## Usage
//!
//! ```rust
//! use fridge_scan::error::{HasRecoverySuggestion, PrepError, Retryable};
//!
//! let error = PrepError::decode("shelf.jpg", "unsupported image format")
//!     .with_context("preprocessing scan image 2 of 5");
//!
//! assert!(!error.is_retryable());
//! assert!(error.recovery_suggestion().is_some());
//! ```

use std::collections::HashMap;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type PrepResult<T> = Result<T, PrepError>;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that fail one call but leave the process healthy
    Error,
    /// Errors that make further work pointless (bad configuration)
    Fatal,
}

/// Metadata about where and why an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action, overriding the per-kind default
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            metadata: HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Base error type for the preprocessing library
#[derive(Debug, Error)]
pub enum PrepError {
    /// The source bytes could not be interpreted as an image
    #[error("failed to decode image '{image}': {reason}")]
    Decode {
        image: String,
        reason: String,
        context: ErrorContext,
    },
    /// The off-screen surface could not be acquired or drawn into
    #[error("failed to render image '{image}': {reason}")]
    Render {
        image: String,
        reason: String,
        context: ErrorContext,
    },
    /// The JPEG encoder rejected the rendered surface
    #[error("failed to encode image '{image}': {reason}")]
    Encode {
        image: String,
        reason: String,
        context: ErrorContext,
    },
    /// The caller cancelled the operation
    #[error("operation cancelled: {operation}")]
    Cancelled {
        operation: String,
        context: ErrorContext,
    },
    /// Configuration validation errors
    #[error("invalid configuration for '{field}' = {value}: {reason}")]
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    #[error("I/O error during {operation}{}: {source}", path_suffix(.path))]
    Io {
        operation: String,
        path: Option<String>,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },
    /// The vision model answered with a non-success status
    #[error("vision API returned status {status}: {body}")]
    Vision {
        status: u16,
        body: String,
        context: ErrorContext,
    },
    /// Transport failures talking to the vision model
    #[error("network error during {operation}: {source}")]
    Network {
        operation: String,
        #[source]
        source: reqwest::Error,
        context: ErrorContext,
    },
    /// A worker task panicked or was aborted
    #[error("background task failed: {reason}")]
    Task {
        reason: String,
        context: ErrorContext,
    },
}

impl PrepError {
    /// Create a decode error
    pub fn decode(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            image: image.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a render error
    pub fn render(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            image: image.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an encode error
    pub fn encode(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            image: image.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error tied to a path
    pub fn io_at(
        operation: impl Into<String>,
        path: impl AsRef<std::path::Path>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.as_ref().display().to_string()),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create a vision API status error
    pub fn vision(status: u16, body: impl Into<String>) -> Self {
        Self::Vision {
            status,
            body: body.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a network error
    pub fn network(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            operation: operation.into(),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create a task error
    pub fn task(reason: impl Into<String>) -> Self {
        Self::Task {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Override the default recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Short machine-friendly name of the error kind
    pub fn category(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Render { .. } => "render",
            Self::Encode { .. } => "encode",
            Self::Cancelled { .. } => "cancelled",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::Vision { .. } => "vision",
            Self::Network { .. } => "network",
            Self::Task { .. } => "task",
        }
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Decode { context, .. }
            | Self::Render { context, .. }
            | Self::Encode { context, .. }
            | Self::Cancelled { context, .. }
            | Self::Config { context, .. }
            | Self::Io { context, .. }
            | Self::Vision { context, .. }
            | Self::Network { context, .. }
            | Self::Task { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Decode { context, .. }
            | Self::Render { context, .. }
            | Self::Encode { context, .. }
            | Self::Cancelled { context, .. }
            | Self::Config { context, .. }
            | Self::Io { context, .. }
            | Self::Vision { context, .. }
            | Self::Network { context, .. }
            | Self::Task { context, .. } => context,
        }
    }

    fn default_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Decode { .. } => {
                Some("Retry with a different photo; JPEG, PNG and WebP are supported")
            }
            Self::Render { .. } => {
                Some("Retry with a smaller photo or lower max width/height bounds")
            }
            Self::Encode { .. } => Some("Retry with a different photo"),
            Self::Config { .. } => Some("Fix the configuration value and run again"),
            Self::Vision { status, .. } if *status == 401 || *status == 403 => {
                Some("Check the Gemini API key")
            }
            Self::Network { .. } => Some("Check network connectivity and retry"),
            _ => None,
        }
    }
}

fn path_suffix(path: &Option<String>) -> String {
    path.as_ref().map(|p| format!(" ({p})")).unwrap_or_default()
}

/// Errors that may succeed when the same call is repeated
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Suggested delay before retrying
    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for PrepError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Vision { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Vision { status: 429, .. } => Some(5_000),
            _ if self.is_retryable() => Some(1_000),
            _ => None,
        }
    }
}

/// Errors that carry a severity level
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for PrepError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Errors that can tell the user what to try next
pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for PrepError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context()
            .recovery_suggestion
            .as_deref()
            .or_else(|| self.default_suggestion())
    }
}

impl From<std::io::Error> for PrepError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<tokio::task::JoinError> for PrepError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::task(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = PrepError::decode("fridge.jpg", "bad magic");
        assert_eq!(error.category(), "decode");
        assert_eq!(
            error.to_string(),
            "failed to decode image 'fridge.jpg': bad magic"
        );
    }

    #[test]
    fn test_error_with_context() {
        let error = PrepError::render("fridge.jpg", "allocation failed")
            .with_context("batch item 3")
            .with_operation("preprocess")
            .with_metadata("width", "99999");

        let ctx = error.context();
        assert_eq!(ctx.context.as_deref(), Some("batch item 3"));
        assert_eq!(ctx.operation.as_deref(), Some("preprocess"));
        assert_eq!(ctx.metadata.get("width").map(String::as_str), Some("99999"));
    }

    #[test]
    fn test_core_errors_are_not_retryable() {
        assert!(!PrepError::decode("a", "b").is_retryable());
        assert!(!PrepError::render("a", "b").is_retryable());
        assert!(!PrepError::cancelled("preprocess").is_retryable());
    }

    #[test]
    fn test_vision_status_classification() {
        assert!(PrepError::vision(503, "overloaded").is_retryable());
        assert_eq!(PrepError::vision(429, "slow down").retry_delay_ms(), Some(5_000));
        assert!(!PrepError::vision(400, "bad request").is_retryable());
        assert_eq!(
            PrepError::vision(403, "denied").recovery_suggestion(),
            Some("Check the Gemini API key")
        );
    }

    #[test]
    fn test_recovery_suggestion_override() {
        let error = PrepError::decode("a", "b");
        assert!(error.recovery_suggestion().unwrap().contains("different photo"));
        let error = error.with_recovery_suggestion("Take the photo again");
        assert_eq!(error.recovery_suggestion(), Some("Take the photo again"));
    }

    #[test]
    fn test_severity() {
        assert_eq!(PrepError::config("quality", "0", "x").severity(), ErrorSeverity::Fatal);
        assert_eq!(PrepError::cancelled("x").severity(), ErrorSeverity::Warning);
        assert_eq!(PrepError::decode("a", "b").severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = PrepError::io_at(
            "reading image",
            "/tmp/missing.jpg",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(
            err.to_string(),
            "I/O error during reading image (/tmp/missing.jpg): gone"
        );
    }
}
