//! Transports that send one prompt with one credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::GeneratorConfig;

/// Markers that identify quota / rate-limit failures in error text.
const TRANSIENT_MARKERS: &[&str] = &["429", "quota", "rate limit", "resource_exhausted"];

/// Failure of a single generation attempt.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("model returned no content")]
    Empty,
    #[error("failed to decode model response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Quota and rate-limit failures: retry at once with another key.
    pub fn is_transient(&self) -> bool {
        let message = match self {
            BackendError::Status { status: 429, .. } => return true,
            BackendError::Status { message, .. } | BackendError::Decode(message) => message,
            _ => return false,
        };
        let text = message.to_ascii_lowercase();
        TRANSIENT_MARKERS.iter().any(|m| text.contains(m))
    }
}

/// One generation request against a text model.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, BackendError>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;
}

/// Google Gemini `generateContent` over reqwest.
///
/// The key travels in the `x-goog-api-key` header so it never shows up in
/// URLs, proxy logs or error messages.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(config: &GeneratorConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(concat!("lectio/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.attempt_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, BackendError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };
        let url = self.endpoint();
        debug!(%url, prompt_chars = prompt.len(), "sending generation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::Empty);
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// Gemini API types
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limits_as_transient() {
        let status = BackendError::Status {
            status: 429,
            message: String::new(),
        };
        assert!(status.is_transient());

        let quota = BackendError::Status {
            status: 403,
            message: "Quota exceeded for quota metric".into(),
        };
        assert!(quota.is_transient());

        let exhausted = BackendError::Status {
            status: 400,
            message: "{\"status\": \"RESOURCE_EXHAUSTED\"}".into(),
        };
        assert!(exhausted.is_transient());

        let limited = BackendError::Decode("Rate limit reached".into());
        assert!(limited.is_transient());
    }

    #[test]
    fn other_failures_are_not_transient() {
        let server = BackendError::Status {
            status: 500,
            message: "internal".into(),
        };
        assert!(!server.is_transient());
        assert!(!BackendError::Empty.is_transient());
        assert!(!BackendError::Timeout(Duration::from_secs(5)).is_transient());
    }

    #[test]
    fn timeout_duration_digits_are_not_a_status() {
        let timeout = BackendError::Timeout(Duration::from_millis(429));
        assert!(timeout.to_string().contains("429"));
        assert!(!timeout.is_transient());
    }

    #[test]
    fn endpoint_does_not_carry_key() {
        let config = GeneratorConfig {
            base_url: "https://example.test/v1beta/".into(),
            model: "gemini-2.0-flash".into(),
            ..GeneratorConfig::default()
        };
        let backend = GeminiBackend::new(&config).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
