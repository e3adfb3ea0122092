//! Whitespace and markup normalization shared by every extractor.
//!
//! All helpers are total: empty or odd input produces an empty string or
//! `None`, never a panic.

use regex::Regex;
use std::sync::LazyLock;

// Quoted attribute values are matched whole; inline-roll titles carry markup.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<(?:"[^"]*"|'[^']*'|[^'">])*>"#).unwrap());

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());

static UNSAFE_CHAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s!?.,~]").unwrap());

static TRAILING_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*:)+\s*$").unwrap());

const HIDDEN_PLACEHOLDER_TEXT: &str = "this message has been hidden";

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace every `<...>` tag with a single space. Entities are left as-is.
pub fn strip_html_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").into_owned()
}

/// Normalized text with symbols and emoji removed.
///
/// Keeps letters, digits, whitespace and `! ? . , ~`.
pub fn to_safe_text(raw: &str) -> String {
    let normalized = normalize_text(raw);
    if normalized.is_empty() {
        return normalized;
    }
    normalize_text(&UNSAFE_CHAR_RE.replace_all(&normalized, ""))
}

/// First signed integer in `raw`, or `None` when there is none.
pub fn extract_first_integer(raw: &str) -> Option<i64> {
    INTEGER_RE
        .find(raw)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Every signed integer in `raw`, in order of appearance.
pub fn extract_all_integers(raw: &str) -> Vec<i64> {
    INTEGER_RE
        .find_iter(raw)
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .collect()
}

pub fn extract_first_integer_from_rendered_html(html: &str) -> Option<i64> {
    extract_first_integer(&normalize_text(&strip_html_tags(html)))
}

/// Tag-stripped, normalized text of an HTML fragment.
pub fn rendered_text(html: &str) -> String {
    normalize_text(&strip_html_tags(html))
}

/// Normalize and drop trailing colons (`"Skill :"` -> `"Skill"`).
pub fn sanitize_trailing_colon(text: &str) -> String {
    normalize_text(&TRAILING_COLON_RE.replace(text, ""))
}

/// Escape text so it can be spliced back into an HTML fragment.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Roll20 replaces messages hidden by the GM with a fixed placeholder line.
pub fn is_hidden_message_placeholder_text(raw: &str) -> bool {
    let normalized = normalize_text(raw).to_lowercase();
    !normalized.is_empty() && normalized.contains(HIDDEN_PLACEHOLDER_TEXT)
}
