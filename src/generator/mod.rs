//! Generative client: credential rotation, retries, and response parsing.
//!
//! Each call rotates through a [`CredentialPool`]. Quota and rate-limit
//! failures move on to the next key at once; other failures wait
//! `attempt * base_delay` first. After `max_attempts` the last error is
//! returned. A successful response is searched for a JSON object, which is
//! read field by field according to the [`FieldPolicy`].

mod backend;
mod credentials;
mod demo;

pub use backend::{Backend, BackendError, GeminiBackend};
pub use credentials::{redact, CredentialPool};
pub use demo::DemoGenerator;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::extract;
use crate::reading::{GeneratedContent, SaintOfTheDay, SanitizedInput};

pub const SAINT_NAME_PLACEHOLDER: &str = "Saint of the Day";
pub const BIOGRAPHY_PLACEHOLDER: &str = "No biography is available for today's saint.";
pub const HOMILY_PLACEHOLDER: &str = "A homily could not be generated for today's readings.";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("no API credentials configured")]
    NoCredentials,
    #[error("failed to set up generation backend: {0}")]
    Setup(#[source] BackendError),
    #[error("generation failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: BackendError,
    },
    #[error("failed to parse model output: {0}")]
    Parse(String),
    #[error("model output is missing field `{0}`")]
    MissingField(&'static str),
}

/// How to treat fields missing from the model's JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Fall back to the source text or a placeholder and keep going
    #[default]
    Lenient,
    /// Fail the whole call
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay after a non-transient failure on `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Everything a generator needs for one call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub language: &'a str,
    pub prompt: &'a str,
    /// Source-language texts, used for fallbacks
    pub source: &'a SanitizedInput,
}

/// Produces translated and generated prose for a day's readings.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<GeneratedContent, GenerationError>;

    /// Generator name for diagnostics
    fn name(&self) -> &'static str;
}

/// Retrying client over a [`Backend`] transport.
pub struct GenerativeClient<B: Backend> {
    backend: B,
    pool: CredentialPool,
    policy: RetryPolicy,
    fields: FieldPolicy,
}

impl<B: Backend> GenerativeClient<B> {
    pub fn new(backend: B, pool: CredentialPool, policy: RetryPolicy) -> Self {
        Self {
            backend,
            pool,
            policy,
            fields: FieldPolicy::default(),
        }
    }

    pub fn with_field_policy(mut self, fields: FieldPolicy) -> Self {
        self.fields = fields;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send the prompt, rotating keys and retrying until text comes back.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last = None;

        for attempt in 1..=max_attempts {
            let key = self.pool.next_key();
            let outcome = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.backend.complete(key, prompt),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout(self.policy.attempt_timeout)),
            };

            let error = match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    info!(
                        backend = self.backend.name(),
                        attempt,
                        key = %redact(key),
                        chars = text.len(),
                        "generation succeeded"
                    );
                    return Ok(text);
                }
                Ok(_) => BackendError::Empty,
                Err(e) => e,
            };

            let transient = error.is_transient();
            warn!(
                backend = self.backend.name(),
                attempt,
                max_attempts,
                key = %redact(key),
                transient,
                error = %error,
                "generation attempt failed"
            );
            if !transient && attempt < max_attempts {
                tokio::time::sleep(self.policy.delay_for(attempt)).await;
            }
            last = Some(error);
        }

        Err(GenerationError::Exhausted {
            attempts: max_attempts,
            last: last.unwrap_or(BackendError::Empty),
        })
    }
}

#[async_trait]
impl<B: Backend> Generator for GenerativeClient<B> {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<GeneratedContent, GenerationError> {
        let raw = self.generate_text(request.prompt).await?;
        parse_content(&raw, request.source, self.fields)
    }

    fn name(&self) -> &'static str {
        self.backend.name()
    }
}

/// Extract and read the model's JSON object.
///
/// With [`FieldPolicy::Lenient`], reading texts and the feast fall back to the
/// source-language input and the rest to fixed placeholders.
pub fn parse_content(
    raw: &str,
    source: &SanitizedInput,
    policy: FieldPolicy,
) -> Result<GeneratedContent, GenerationError> {
    let object = extract::extract_json_value(raw)
        .ok_or_else(|| GenerationError::Parse("no JSON object found in model output".into()))?;
    let saint = object.get("saintOfTheDay").and_then(Value::as_object);
    let saint_field = |name: &str| saint.and_then(|s| s.get(name));

    Ok(GeneratedContent {
        feast: field(&object, "feast", &source.feast_day, policy)?,
        saint_of_the_day: SaintOfTheDay {
            name: pick(
                saint_field("name"),
                "saintOfTheDay.name",
                SAINT_NAME_PLACEHOLDER,
                policy,
            )?,
            biography: pick(
                saint_field("biography"),
                "saintOfTheDay.biography",
                BIOGRAPHY_PLACEHOLDER,
                policy,
            )?,
        },
        first_reading_text: field(
            &object,
            "firstReadingText",
            &source.first_reading.text,
            policy,
        )?,
        responsorial_psalm_text: field(
            &object,
            "responsorialPsalmText",
            &source.psalm.text,
            policy,
        )?,
        gospel_text: field(&object, "gospelText", &source.gospel.text, policy)?,
        homily: field(&object, "homily", HOMILY_PLACEHOLDER, policy)?,
    })
}

fn field(
    object: &Map<String, Value>,
    name: &'static str,
    fallback: &str,
    policy: FieldPolicy,
) -> Result<String, GenerationError> {
    pick(object.get(name), name, fallback, policy)
}

fn pick(
    value: Option<&Value>,
    name: &'static str,
    fallback: &str,
    policy: FieldPolicy,
) -> Result<String, GenerationError> {
    match value.and_then(Value::as_str).map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => match policy {
            FieldPolicy::Strict => Err(GenerationError::MissingField(name)),
            FieldPolicy::Lenient => {
                warn!(field = name, "model output missing field, using fallback");
                Ok(fallback.to_string())
            }
        },
    }
}
