//! Feed client for the daily readings provider.
//!
//! The provider serves one JSONP script per calendar date. The body looks like
//! `universalisCallback({...});` and is unwrapped before being parsed as JSON.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::reading::{FeedRecord, Reading, Readings};

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("lectio/", env!("CARGO_PKG_VERSION"));

/// Callback name requested from the provider
const CALLBACK: &str = "universalisCallback";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to fetch readings: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("readings provider returned HTTP {status}")]
    Status { status: u16 },
    #[error("failed to parse readings feed: {0}")]
    Parse(String),
}

/// Anything that can produce the feed for a given date.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> Result<FeedRecord, FeedError>;

    /// Fetch the feed for the local current date.
    async fn fetch_today(&self) -> Result<FeedRecord, FeedError> {
        self.fetch(chrono::Local::now().date_naive()).await
    }
}

/// HTTP client for the Universalis JSONP Mass feed.
pub struct UniversalisClient {
    client: Client,
    base_url: String,
    region: String,
}

impl UniversalisClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            region: config.region.clone(),
        })
    }

    /// Request URL for the given date
    pub fn url_for(&self, date: NaiveDate) -> String {
        feed_url(&self.base_url, &self.region, date)
    }
}

#[async_trait]
impl FeedSource for UniversalisClient {
    async fn fetch(&self, date: NaiveDate) -> Result<FeedRecord, FeedError> {
        let url = self.url_for(date);
        debug!(%url, "fetching readings feed");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;

        let record = parse_feed(&body)?;
        info!(date = %record.date, day = %record.day, "fetched readings feed");
        Ok(record)
    }
}

/// Numeric `YYYYMMDD` stamp used in the feed path.
pub fn feed_date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Build the dated feed URL.
pub fn feed_url(base_url: &str, region: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/{}/jsonpmass.js?callback={}",
        base_url.trim_end_matches('/'),
        region.trim_matches('/'),
        feed_date_stamp(date),
        CALLBACK
    )
}

/// Extract the payload between the first `(` and the last `)`.
pub fn unwrap_envelope(body: &str) -> Result<&str, FeedError> {
    let start = body
        .find('(')
        .ok_or_else(|| FeedError::Parse("missing opening parenthesis in JSONP envelope".into()))?;
    let end = body
        .rfind(')')
        .ok_or_else(|| FeedError::Parse("missing closing parenthesis in JSONP envelope".into()))?;
    if end <= start {
        return Err(FeedError::Parse("unbalanced JSONP envelope".into()));
    }
    let inner = body[start + 1..end].trim();
    if inner.is_empty() {
        return Err(FeedError::Parse("empty JSONP payload".into()));
    }
    Ok(inner)
}

/// Unwrap and validate a full provider response body.
pub fn parse_feed(body: &str) -> Result<FeedRecord, FeedError> {
    let payload = unwrap_envelope(body)?;
    let wire: WireFeed =
        serde_json::from_str(payload).map_err(|e| FeedError::Parse(e.to_string()))?;
    Ok(wire.into())
}

// Provider wire format
#[derive(Deserialize)]
struct WireFeed {
    #[serde(default)]
    date: String,
    day: String,
    #[serde(rename = "Mass_R1")]
    first_reading: WireReading,
    #[serde(rename = "Mass_Ps")]
    psalm: WireReading,
    #[serde(rename = "Mass_R2", default)]
    second_reading: Option<WireReading>,
    #[serde(rename = "Mass_GA", default)]
    gospel_acclamation: Option<WireReading>,
    #[serde(rename = "Mass_G")]
    gospel: WireReading,
    #[serde(default)]
    copyright: Option<WireCopyright>,
}

#[derive(Deserialize)]
struct WireReading {
    source: String,
    text: String,
}

#[derive(Deserialize)]
struct WireCopyright {
    text: String,
}

impl From<WireReading> for Reading {
    fn from(r: WireReading) -> Self {
        Reading::new(r.source, r.text)
    }
}

impl From<WireFeed> for FeedRecord {
    fn from(w: WireFeed) -> Self {
        FeedRecord {
            date: w.date,
            day: w.day,
            readings: Readings {
                first_reading: w.first_reading.into(),
                psalm: w.psalm.into(),
                second_reading: w.second_reading.map(Into::into),
                gospel_acclamation: w.gospel_acclamation.map(Into::into),
                gospel: w.gospel.into(),
            },
            copyright: w.copyright.map(|c| c.text),
        }
    }
}
