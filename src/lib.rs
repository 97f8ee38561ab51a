//! # Lectio
//!
//! Today's Mass readings, translated and paired with a homily by an LLM.
//!
//! ## Pipeline
//!
//! ```text
//! feed -> sanitize -> prompt -> generator -> extract -> merge
//! ```
//!
//! - **Feed**: dated JSONP feed from the readings provider
//! - **Generation**: Gemini with rotating API keys and retries
//! - **Merge**: citations always come from the feed, prose from the model

pub mod config;
pub mod daily;
pub mod extract;
pub mod feed;
pub mod generator;
pub mod prompt;
pub mod reading;
pub mod sanitize;

pub use config::Config;
pub use daily::{DailyReadingService, ReadingError};
pub use reading::OutputRecord;
