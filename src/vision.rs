//! # Vision Model Requests
//!
//! Request/response contract of the Gemini `generateContent` call that consumes
//! preprocessed photos, plus a thin async client.
//!
//! ## Wire Format
//!
//! ```json
//! { "contents": [ { "parts": [
//!     { "text": "List every ingredient you can see" },
//!     { "inline_data": { "mime_type": "image/jpeg", "data": "<base64>" } }
//! ] } ] }
//! ```
//!
//! The generated text is read from `candidates[0].content.parts[0].text`; a
//! response without it yields an empty string. Any non-success status is fatal
//! for that call and reported as [`PrepError::Vision`] with status and body.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::VisionSettings;
use crate::error::{PrepError, PrepResult};
use crate::preprocess::ProcessedImage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One part of a request: prompt text or an inline image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionRequest {
    pub contents: Vec<Content>,
}

impl VisionRequest {
    /// Prompt part first, then one inline part per image, in order.
    pub fn new(prompt: impl Into<String>, images: &[ProcessedImage]) -> Self {
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(Part::Text {
            text: prompt.into(),
        });
        parts.extend(images.iter().map(|image| Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type().to_string(),
                data: image.base64.clone(),
            },
        }));
        Self {
            contents: vec![Content { parts }],
        }
    }

    pub fn image_count(&self) -> usize {
        self.contents
            .iter()
            .flat_map(|c| &c.parts)
            .filter(|p| matches!(p, Part::InlineData { .. }))
            .count()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VisionResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl VisionResponse {
    /// Text of the first part of the first candidate, or `""`.
    pub fn text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .unwrap_or("")
    }
}

/// Anything that can answer a [`VisionRequest`] with generated text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, request: &VisionRequest) -> PrepResult<String>;
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: &VisionSettings, api_key: impl Into<String>) -> PrepResult<Self> {
        settings.validate()?;
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PrepError::config("api_key", "\"\"", "Gemini API key is missing")
                .with_recovery_suggestion(format!(
                    "Set {} or pass --api-key",
                    settings.api_key_env
                )));
        }
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| PrepError::network("building HTTP client", e))?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    /// Builds a client with the key read from `settings.api_key_env`.
    pub fn from_env(settings: &VisionSettings) -> PrepResult<Self> {
        let key = settings.api_key_from_env().unwrap_or_default();
        Self::new(settings, key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, request: &VisionRequest) -> PrepResult<String> {
        let url = self.url();
        debug!(%url, images = request.image_count(), "Sending generateContent request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| PrepError::network("generateContent", e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrepError::vision(status.as_u16(), body).with_metadata("model", &self.model));
        }

        let parsed: VisionResponse = response
            .json()
            .await
            .map_err(|e| PrepError::network("reading generateContent response", e.without_url()))?;
        let text = parsed.text().to_string();
        info!(model = %self.model, chars = text.len(), "Vision model responded");
        Ok(text)
    }
}
