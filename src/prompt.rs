//! Prompt construction for the content-generation request.

use crate::reading::SanitizedInput;

/// Build the instruction sent to the model.
///
/// Only the reading texts go into the prompt. Citations are merged back in
/// from the feed afterwards, so the model is told to leave them out.
pub fn build(language: &str, feast_day: &str, readings: &SanitizedInput) -> String {
    let format_task = if language.trim().eq_ignore_ascii_case("english") {
        "The requested language is English: return the original English texts unchanged in wording, \
but well-formatted with proper paragraphs (one paragraph per line)."
            .to_string()
    } else {
        format!(
            "Translate the feast day name and every scripture reading faithfully into {language}, \
keeping the paragraph structure of the source (one paragraph per line)."
        )
    };

    format!(
        r#"You are an expert in Catholic theology, liturgy, hagiography, and translation.
Your entire response, including every text field of the JSON object, must be written in {language}.

The content below is for the feast of: {feast_day}.

Tasks:
1. Format and translate the content. {format_task}
2. Write an original homily based on these readings. It must be theologically rich, reflective and mystical in spirit, and keep a scholarly, academic register.
3. Identify the saint of the day for this date and write a brief, inspiring biography.

English source content:
- Feast day: {feast_day}
- First reading:
{first}
- Responsorial psalm:
{psalm}
- Gospel:
{gospel}

Biblical references (such as "Matthew 10:1-7") are supplied separately. Do not invent, alter, or include any citation or reference string in your output.

You MUST respond with a single valid JSON object matching this exact schema:
{{
  "feast": "string - the feast day name in {language}",
  "saintOfTheDay": {{
    "name": "string - the saint's name in {language}",
    "biography": "string - a short biography in {language}"
  }},
  "firstReadingText": "string - the first reading with paragraphs",
  "responsorialPsalmText": "string - the responsorial psalm with paragraphs",
  "gospelText": "string - the gospel with paragraphs",
  "homily": "string - the homily"
}}

Do not include markdown formatting, code blocks, or explanations. Only output the raw JSON object."#,
        first = readings.first_reading.text,
        psalm = readings.psalm.text,
        gospel = readings.gospel.text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::SanitizedReading;

    fn input() -> SanitizedInput {
        let reading = |reference: &str, text: &str| SanitizedReading {
            reference: reference.into(),
            text: text.into(),
        };
        SanitizedInput {
            feast_day: "Ordinary Time".into(),
            first_reading: reading("Ephesians 1:11-14", "In him we were claimed."),
            psalm: reading("Psalm 32", "Ring out your joy."),
            gospel: reading("Luke 12:1-7", "Beware of the yeast."),
            copyright: None,
        }
    }

    #[test]
    fn embeds_language_feast_and_texts() {
        let prompt = build("Italian", "Ordinary Time", &input());
        assert!(prompt.contains("must be written in Italian"));
        assert!(prompt.contains("feast of: Ordinary Time"));
        assert!(prompt.contains("In him we were claimed."));
        assert!(prompt.contains("Ring out your joy."));
        assert!(prompt.contains("Beware of the yeast."));
        assert!(prompt.contains("Translate the feast day name"));
    }

    #[test]
    fn never_leaks_references() {
        let prompt = build("German", "Ordinary Time", &input());
        assert!(!prompt.contains("Ephesians 1:11-14"));
        assert!(!prompt.contains("Luke 12:1-7"));
        assert!(prompt.contains("Do not invent, alter, or include any citation"));
    }

    #[test]
    fn documents_every_field() {
        let prompt = build("Spanish", "Ordinary Time", &input());
        for field in [
            "\"feast\"",
            "\"saintOfTheDay\"",
            "\"name\"",
            "\"biography\"",
            "\"firstReadingText\"",
            "\"responsorialPsalmText\"",
            "\"gospelText\"",
            "\"homily\"",
        ] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("scholarly, academic register"));
    }

    #[test]
    fn english_keeps_original_wording() {
        let prompt = build("English", "Ordinary Time", &input());
        assert!(prompt.contains("return the original English texts"));
        assert!(!prompt.contains("Translate the feast day name"));
    }
}
