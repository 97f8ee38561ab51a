//! Daily reading service: feed, prompt, generation, merge.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, ConfigError, Provider};
use crate::feed::{FeedError, FeedSource, UniversalisClient};
use crate::generator::{
    CredentialPool, DemoGenerator, GeminiBackend, GenerationError, GenerationRequest,
    GenerativeClient, Generator,
};
use crate::prompt;
use crate::reading::{OutputRecord, SanitizedInput};

#[derive(Error, Debug)]
pub enum ReadingError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Long US-English date, e.g. "October 16, 2026".
pub fn display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Wires a feed source and a generator into one call.
#[derive(Clone)]
pub struct DailyReadingService {
    feed: Arc<dyn FeedSource>,
    generator: Arc<dyn Generator>,
}

impl DailyReadingService {
    pub fn new(feed: Arc<dyn FeedSource>, generator: Arc<dyn Generator>) -> Self {
        Self { feed, generator }
    }

    /// Build the production service from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ReadingError> {
        let feed = UniversalisClient::new(&config.feed)?;
        let generator: Arc<dyn Generator> = match config.generator.provider {
            Provider::Demo => Arc::new(DemoGenerator::new()),
            Provider::Gemini => {
                let pool = CredentialPool::new(config.api_keys()?.iter().cloned())?;
                let backend = GeminiBackend::new(&config.generator)
                    .map_err(GenerationError::Setup)?;
                Arc::new(
                    GenerativeClient::new(backend, pool, config.generator.retry_policy())
                        .with_field_policy(config.generator.field_policy),
                )
            }
        };
        Ok(Self::new(Arc::new(feed), generator))
    }

    pub fn feed(&self) -> &dyn FeedSource {
        self.feed.as_ref()
    }

    /// Readings for the local current date in `language`.
    pub async fn get_daily_reading(&self, language: &str) -> Result<OutputRecord, ReadingError> {
        self.get_daily_reading_on(language, chrono::Local::now().date_naive())
            .await
    }

    /// Readings for a specific date in `language`.
    pub async fn get_daily_reading_on(
        &self,
        language: &str,
        date: NaiveDate,
    ) -> Result<OutputRecord, ReadingError> {
        let feed = self.feed.fetch(date).await?;
        let input = SanitizedInput::from_feed(&feed);
        let prompt = prompt::build(language, &input.feast_day, &input);

        let request = GenerationRequest {
            language,
            prompt: &prompt,
            source: &input,
        };
        let generated = self.generator.generate(&request).await?;
        info!(
            %language,
            generator = self.generator.name(),
            feast = %generated.feast,
            "daily reading ready"
        );

        Ok(OutputRecord::merge(display_date(date), &input, generated))
    }

    /// The prompt that would be sent for `date`, without calling the model.
    pub async fn preview_prompt(
        &self,
        language: &str,
        date: NaiveDate,
    ) -> Result<String, ReadingError> {
        let feed = self.feed.fetch(date).await?;
        let input = SanitizedInput::from_feed(&feed);
        Ok(prompt::build(language, &input.feast_day, &input))
    }
}
