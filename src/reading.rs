//! Reading records - the data flowing through the pipeline.
//!
//! `FeedRecord` is what the provider sent, `SanitizedInput` is its plain-text
//! form, `GeneratedContent` is what the model returned, and `OutputRecord` is
//! the merged result handed to whatever renders it.

use serde::{Deserialize, Serialize};

use crate::sanitize;

/// One reading as published by the feed provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Citation markup, e.g. `Isaiah 55:10&#x2010;11`
    pub source: String,
    /// Reading body as an HTML fragment
    pub text: String,
}

impl Reading {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// The set of Mass readings for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readings {
    pub first_reading: Reading,
    pub psalm: Reading,
    pub second_reading: Option<Reading>,
    pub gospel_acclamation: Option<Reading>,
    pub gospel: Reading,
}

/// Feed data for one calendar date, verbatim from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    /// Provider's own date label
    pub date: String,
    /// Raw feast label
    pub day: String,
    pub readings: Readings,
    pub copyright: Option<String>,
}

/// A reading reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedReading {
    pub reference: String,
    pub text: String,
}

impl SanitizedReading {
    fn from_reading(reading: &Reading) -> Self {
        Self {
            reference: sanitize::strip(&reading.source),
            text: sanitize::format_paragraphs(&reading.text),
        }
    }
}

/// Plain-text view of a `FeedRecord`, the input to prompt building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedInput {
    pub feast_day: String,
    pub first_reading: SanitizedReading,
    pub psalm: SanitizedReading,
    pub gospel: SanitizedReading,
    pub copyright: Option<String>,
}

impl SanitizedInput {
    pub fn from_feed(feed: &FeedRecord) -> Self {
        Self {
            feast_day: sanitize::strip(&feed.day),
            first_reading: SanitizedReading::from_reading(&feed.readings.first_reading),
            psalm: SanitizedReading::from_reading(&feed.readings.psalm),
            gospel: SanitizedReading::from_reading(&feed.readings.gospel),
            copyright: feed
                .copyright
                .as_deref()
                .map(sanitize::strip)
                .filter(|c| !c.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaintOfTheDay {
    pub name: String,
    pub biography: String,
}

/// Prose produced by the model, all in the target language.
///
/// Field names match the JSON object the model is asked to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub feast: String,
    pub saint_of_the_day: SaintOfTheDay,
    pub first_reading_text: String,
    pub responsorial_psalm_text: String,
    pub gospel_text: String,
    pub homily: String,
}

/// A reading as shown to the reader: untranslated citation plus prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSection {
    pub reference: String,
    pub text: String,
}

/// The merged record handed to the presentation layer.
///
/// `reference` fields always come from the feed; prose fields always come
/// from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub date: String,
    pub feast: String,
    pub saint_of_the_day: SaintOfTheDay,
    pub first_reading: ReadingSection,
    pub responsorial_psalm: ReadingSection,
    pub gospel: ReadingSection,
    pub homily: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
}

impl OutputRecord {
    /// Merge feed references with generated prose.
    pub fn merge(date: String, input: &SanitizedInput, generated: GeneratedContent) -> Self {
        Self {
            date,
            feast: generated.feast,
            saint_of_the_day: generated.saint_of_the_day,
            first_reading: ReadingSection {
                reference: input.first_reading.reference.clone(),
                text: generated.first_reading_text,
            },
            responsorial_psalm: ReadingSection {
                reference: input.psalm.reference.clone(),
                text: generated.responsorial_psalm_text,
            },
            gospel: ReadingSection {
                reference: input.gospel.reference.clone(),
                text: generated.gospel_text,
            },
            homily: generated.homily,
            copyright: input.copyright.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feed() -> FeedRecord {
        FeedRecord {
            date: "Friday 16 October 2026".into(),
            day: "<b>Saint Margaret Mary Alacoque</b>, Virgin".into(),
            readings: Readings {
                first_reading: Reading::new(
                    "Ephesians 1:11&#x2010;14",
                    "<div>In him we were claimed</div>",
                ),
                psalm: Reading::new(
                    "Psalm 32(33)",
                    "<div>Ring out your joy</div><div>to the Lord</div>",
                ),
                second_reading: None,
                gospel_acclamation: None,
                gospel: Reading::new("Luke 12:1&#x2010;7", "<div>Beware of the yeast</div>"),
            },
            copyright: Some("<p>Texts &#169; Universalis</p>".into()),
        }
    }

    #[test]
    fn sanitized_input_strips_markup() {
        let input = SanitizedInput::from_feed(&sample_feed());
        assert_eq!(input.feast_day, "Saint Margaret Mary Alacoque, Virgin");
        assert_eq!(input.first_reading.reference, "Ephesians 1:11-14");
        assert_eq!(input.psalm.text, "Ring out your joy\nto the Lord");
        assert_eq!(input.copyright.as_deref(), Some("Texts \u{a9} Universalis"));
    }

    #[test]
    fn output_serializes_camel_case() {
        let input = SanitizedInput::from_feed(&sample_feed());
        let generated = GeneratedContent {
            feast: "Santa Margarita".into(),
            saint_of_the_day: SaintOfTheDay {
                name: "Santa Margarita María".into(),
                biography: "Religiosa visitandina.".into(),
            },
            first_reading_text: "En él".into(),
            responsorial_psalm_text: "Aclamad".into(),
            gospel_text: "Guardaos".into(),
            homily: "Hermanos".into(),
        };
        let record = OutputRecord::merge("October 16, 2026".into(), &input, generated);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["saintOfTheDay"]["name"], "Santa Margarita María");
        assert_eq!(json["responsorialPsalm"]["reference"], "Psalm 32(33)");
        assert_eq!(json["gospel"]["text"], "Guardaos");
    }
}
