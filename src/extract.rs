//! Pull a JSON object out of free-form model output.
//!
//! Models wrap their JSON in prose and code fences, and sometimes emit more
//! than one brace-delimited fragment. The object is located with an explicit
//! depth counter rather than a first-`{`-to-last-`}` slice.

use serde_json::{Map, Value};

/// Remove markdown code fence markers (```` ```json ```` and ```` ``` ````).
///
/// Fences inside JSON string literals are kept. An info string is only
/// dropped after an opening fence.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut fence_open = false;

    while let Some(c) = rest.chars().next() {
        if !in_string && rest.starts_with("```") {
            rest = &rest[3..];
            if !fence_open {
                let info_len = rest
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(rest.len());
                rest = &rest[info_len..];
            }
            fence_open = !fence_open;
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];

        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        // Quotes in surrounding prose do not open strings.
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    out
}

/// Byte range of the balanced `{...}` starting at `start`.
///
/// Braces inside string literals are ignored. Returns `None` when the text
/// ends before depth returns to zero.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.get(start), Some(&b'{'));

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Return the first balanced JSON object found in `raw`, as text.
///
/// Fences are stripped first. Scanning starts at the first `{`; if that
/// candidate is not valid JSON, scanning resumes after its closing brace.
/// An unbalanced candidate ends the search.
pub fn extract_json_object(raw: &str) -> Option<String> {
    extract_json_map(raw).map(|(text, _)| text)
}

/// Like [`extract_json_object`], but returns the parsed object.
pub fn extract_json_value(raw: &str) -> Option<Map<String, Value>> {
    extract_json_map(raw).map(|(_, map)| map)
}

fn extract_json_map(raw: &str) -> Option<(String, Map<String, Value>)> {
    let cleaned = strip_code_fences(raw);
    let mut search_from = 0;

    while let Some(rel) = cleaned[search_from..].find('{') {
        let start = search_from + rel;
        // Everything after an unterminated object belongs to it.
        let end = balanced_object_end(&cleaned, start)?;
        let candidate = &cleaned[start..=end];
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return Some((candidate.to_string(), map));
        }
        // Never return an object nested inside a rejected one.
        search_from = end + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_object_inside_fences_and_prose() {
        let raw = "Sure! ```json\n{\"a\": {\"b\": 1}}\n``` thanks";
        assert_eq!(extract_json_object(raw).as_deref(), Some("{\"a\": {\"b\": 1}}"));
        let value = Value::Object(extract_json_value(raw).unwrap());
        assert_eq!(value, json!({"a": {"b": 1}}));
    }

    #[test]
    fn stops_at_matching_brace_not_last_brace() {
        let raw = "{\"feast\": \"x\"} and later a stray {note}";
        assert_eq!(extract_json_object(raw).as_deref(), Some("{\"feast\": \"x\"}"));
    }

    #[test]
    fn skips_non_json_fragments_in_prose() {
        let raw = "Here is the {result} you asked for: {\"homily\": \"Brothers and sisters\"}";
        assert_eq!(
            extract_json_object(raw).as_deref(),
            Some("{\"homily\": \"Brothers and sisters\"}")
        );
    }

    #[test]
    fn braces_inside_strings_do_not_count() {
        let raw = r#"{"homily": "God is love } { truly", "quote": "say \"}\" twice"}"#;
        let map = extract_json_value(raw).unwrap();
        assert_eq!(map["homily"], "God is love } { truly");
        assert_eq!(map["quote"], "say \"}\" twice");
    }

    #[test]
    fn no_object_is_none() {
        assert!(extract_json_object("I cannot help with that.").is_none());
        assert!(extract_json_object("").is_none());
        assert!(extract_json_object("{\"unterminated\": 1").is_none());
        assert!(extract_json_object("[1, 2, 3]").is_none());
    }

    #[test]
    fn invalid_outer_object_does_not_yield_nested_one() {
        let raw = r#"{"feast": "Tiempo", "homily": "Dijo "amor" siempre", "saintOfTheDay": {"name": "San Lucas", "biography": "Evangelista"}}"#;
        assert!(extract_json_object(raw).is_none());
        assert!(extract_json_value(raw).is_none());
    }

    #[test]
    fn valid_object_after_invalid_one_is_found() {
        let raw = r#"{draft: {"x": 1}} then {"homily": "Hermanos"}"#;
        assert_eq!(
            extract_json_object(raw).as_deref(),
            Some(r#"{"homily": "Hermanos"}"#)
        );
    }

    #[test]
    fn fences_inside_string_values_survive() {
        let raw = "```json\n{\"homily\": \"use ```rust``` here\"}\n```Hope this helps";
        assert_eq!(
            strip_code_fences(raw),
            "\n{\"homily\": \"use ```rust``` here\"}\nHope this helps"
        );
        let map = extract_json_value(raw).unwrap();
        assert_eq!(map["homily"], "use ```rust``` here");
    }

    #[test]
    fn closing_fence_keeps_following_word() {
        assert_eq!(strip_code_fences("```json\n{}```Hope"), "\n{}Hope");
    }

    #[test]
    fn strips_fences_with_and_without_info_string() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "\n{}\n");
        assert_eq!(strip_code_fences("```\n{}\n```"), "\n{}\n");
        assert_eq!(strip_code_fences("no fences"), "no fences");
    }
}
