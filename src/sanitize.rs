//! Text sanitizer for provider HTML fragments.
//!
//! The feed ships reading texts as small HTML fragments. They are parsed with
//! `scraper` (html5ever) so every entity is decoded, then flattened to plain text.

use scraper::{ElementRef, Html, Node};

/// Elements whose boundaries separate words or paragraphs.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section", "table", "td",
    "th", "tr", "ul",
];

/// Strip all markup and return a single line of plain text.
///
/// Block boundaries become spaces, whitespace runs collapse to one space.
pub fn strip(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let flat = flatten(html, ' ');
    flat.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup but keep paragraph structure.
///
/// Every block boundary becomes a line break; blank lines are dropped so
/// paragraphs are separated by exactly one `\n`.
pub fn format_paragraphs(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let flat = flatten(html, '\n');
    flat.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Walk the parsed fragment, emitting text and `separator` at block boundaries.
fn flatten(html: &str, separator: char) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    walk(fragment.root_element(), separator, &mut out);
    normalize_entities(&out)
}

fn walk(element: ElementRef<'_>, separator: char, out: &mut String) {
    let is_block = BLOCK_ELEMENTS.contains(&element.value().name());
    if is_block {
        out.push(separator);
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                // Source newlines inside text are layout, not paragraph breaks.
                out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, separator, out);
                }
            }
            _ => {}
        }
    }
    if is_block {
        out.push(separator);
    }
}

/// Map the provider's decoded special characters to plain ASCII.
fn normalize_entities(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{00A0}' => ' ',
            '\u{2010}' | '\u{2011}' => '-',
            other => other,
        })
        .collect()
}
