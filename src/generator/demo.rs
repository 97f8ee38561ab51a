//! Offline generator for demos and local runs without API keys.

use async_trait::async_trait;

use super::{GenerationError, GenerationRequest, Generator};
use crate::reading::{GeneratedContent, SaintOfTheDay};

const DEMO_SAINT: &str = "Saint Thomas Aquinas";
const DEMO_BIOGRAPHY: &str = "Thomas Aquinas (1225-1274) was an Italian Dominican friar and priest, \
an influential philosopher and theologian known for his synthesis of Aristotelian philosophy \
with Christian theology in the Summa Theologica. He was canonized in 1323.";
const DEMO_HOMILY: &str = "Today's readings invite us to contemplate the mystery of God's love \
made manifest in ordinary days. The first reading calls us to be instruments of grace, while \
the Gospel asks us to live as disciples without pretence. Beneath the noise of the world our \
identity rests in our relationship with the Divine, a relationship that is not merely \
intellectual but transforms every part of our being.";

/// Deterministic content that mirrors the source texts.
///
/// Non-English output is tagged with the requested language instead of
/// being translated.
#[derive(Debug, Default, Clone)]
pub struct DemoGenerator;

impl DemoGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Generator for DemoGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<GeneratedContent, GenerationError> {
        let source = request.source;
        let language = request.language;
        let english = language.trim().eq_ignore_ascii_case("english");
        let tag = |text: &str| {
            if english {
                text.to_string()
            } else {
                format!("{text}\n[Translated to {language}]")
            }
        };
        let label = |text: &str| {
            if english {
                text.to_string()
            } else {
                format!("{text} ({language})")
            }
        };

        Ok(GeneratedContent {
            feast: label(&source.feast_day),
            saint_of_the_day: SaintOfTheDay {
                name: label(DEMO_SAINT),
                biography: label(DEMO_BIOGRAPHY),
            },
            first_reading_text: tag(&source.first_reading.text),
            responsorial_psalm_text: tag(&source.psalm.text),
            gospel_text: tag(&source.gospel.text),
            homily: label(DEMO_HOMILY),
        })
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{SanitizedInput, SanitizedReading};

    fn source() -> SanitizedInput {
        let reading = |text: &str| SanitizedReading {
            reference: "Ref 1:1".into(),
            text: text.into(),
        };
        SanitizedInput {
            feast_day: "Ordinary Time".into(),
            first_reading: reading("first"),
            psalm: reading("psalm"),
            gospel: reading("gospel"),
            copyright: None,
        }
    }

    #[tokio::test]
    async fn english_mirrors_source() {
        let source = source();
        let request = GenerationRequest {
            language: "English",
            prompt: "",
            source: &source,
        };
        let out = DemoGenerator::new().generate(&request).await.unwrap();
        assert_eq!(out.feast, "Ordinary Time");
        assert_eq!(out.first_reading_text, "first");
        assert_eq!(out.saint_of_the_day.name, DEMO_SAINT);
    }

    #[tokio::test]
    async fn other_languages_are_tagged() {
        let source = source();
        let request = GenerationRequest {
            language: "Spanish",
            prompt: "",
            source: &source,
        };
        let out = DemoGenerator::new().generate(&request).await.unwrap();
        assert_eq!(out.feast, "Ordinary Time (Spanish)");
        assert_eq!(out.gospel_text, "gospel\n[Translated to Spanish]");
    }
}
