//! Field extraction over roll-template HTML fragments.
//!
//! Roll20 renders every roll template from a small, fixed markup vocabulary
//! (`table`/`caption`/`tr`/`td`, a handful of `div`/`span` containers), so the
//! extractors work on the fragment text with a tag scanner instead of a full
//! DOM. Rules shared by every function here:
//!
//! - matches are taken in document order, first match wins;
//! - classes match by exact token (`sheet-target` never matches
//!   `sheet-target-result`);
//! - an element's inner HTML runs to its balanced closing tag of the same name.

use regex::Regex;
use rollscribe_core::text::{extract_first_integer, normalize_text, rendered_text};
use std::sync::LazyLock;

pub const TEMPLATE_VALUE_CLASS: &str = "sheet-template_value";
pub const TEMPLATE_LABEL_CLASS: &str = "sheet-template_label";
pub const INLINE_ROLL_CLASS: &str = "inlinerollresult";

// Quoted attribute values are matched whole; inline-roll titles carry markup.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9-]*)\b((?:"[^"]*"|'[^']*'|[^'">])*)>"#).unwrap()
});

static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

static TEMPLATE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsheet-rolltemplate-([a-z0-9-]+)").unwrap());

static CAPTION_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*").unwrap());

// ── Tag scanner ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct TagToken<'a> {
    name: &'a str,
    attrs: &'a str,
    closing: bool,
    start: usize,
    end: usize,
}

impl TagToken<'_> {
    fn self_closing(&self) -> bool {
        !self.closing && self.attrs.trim_end().ends_with('/')
    }
}

fn scan_tags(html: &str) -> Vec<TagToken<'_>> {
    TAG_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(TagToken {
                name: caps.get(2)?.as_str(),
                attrs: caps.get(3).map_or("", |m| m.as_str()),
                closing: caps.get(1).is_some_and(|m| !m.is_empty()),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// One element located in a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    pub attrs: &'a str,
    pub inner_html: &'a str,
    start: usize,
    end: usize,
}

impl Element<'_> {
    pub fn has_class(&self, class: &str) -> bool {
        has_class_token(self.attrs, class)
    }

    pub fn text(&self) -> String {
        rendered_text(self.inner_html)
    }
}

fn class_attr(attrs: &str) -> Option<&str> {
    let caps = CLASS_ATTR_RE.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// Whether a raw attribute string carries `class` as an exact class token.
pub fn has_class_token(attrs: &str, class: &str) -> bool {
    let class = class.trim();
    !class.is_empty()
        && class_attr(attrs).is_some_and(|value| value.split_whitespace().any(|t| t == class))
}

/// Every `tag` element whose class list contains all of `classes`, in
/// document order. Nested matches are included. Unclosed elements are
/// skipped.
fn find_all<'a>(html: &'a str, tag: &str, classes: &[&str]) -> Vec<Element<'a>> {
    let tokens = scan_tags(html);
    let mut found = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        if token.closing || !token.name.eq_ignore_ascii_case(tag) {
            continue;
        }
        if !classes.iter().all(|class| has_class_token(token.attrs, class)) {
            continue;
        }
        if token.self_closing() {
            found.push(Element {
                attrs: token.attrs,
                inner_html: "",
                start: token.start,
                end: token.end,
            });
            continue;
        }
        if let Some(close) = matching_close(&tokens, index) {
            found.push(Element {
                attrs: token.attrs,
                inner_html: &html[token.end..close.start],
                start: token.start,
                end: close.end,
            });
        }
    }
    found
}

fn matching_close<'t, 'a>(tokens: &'t [TagToken<'a>], open: usize) -> Option<&'t TagToken<'a>> {
    let name = tokens[open].name;
    let mut depth = 0usize;
    for token in &tokens[open + 1..] {
        if !token.name.eq_ignore_ascii_case(name) || token.self_closing() {
            continue;
        }
        if !token.closing {
            depth += 1;
        } else if depth == 0 {
            return Some(token);
        } else {
            depth -= 1;
        }
    }
    None
}

/// Matches that are not nested inside an earlier match.
fn outermost(elements: Vec<Element<'_>>) -> Vec<Element<'_>> {
    let mut kept: Vec<Element<'_>> = Vec::with_capacity(elements.len());
    for element in elements {
        if kept.last().is_some_and(|prev| element.start < prev.end) {
            continue;
        }
        kept.push(element);
    }
    kept
}

/// Top-level `tag` elements carrying every class in `classes`.
pub fn collect_elements<'a>(html: &'a str, tag: &str, classes: &[&str]) -> Vec<Element<'a>> {
    outermost(find_all(html, tag, classes))
}

/// First `tag` element carrying every class in `classes`, nested or not.
pub fn find_element<'a>(html: &'a str, tag: &str, classes: &[&str]) -> Option<Element<'a>> {
    find_all(html, tag, classes).into_iter().next()
}

// ── Template-level fields ───────────────────────────────────────────────────

/// Lower-cased `<name>` of the first `sheet-rolltemplate-<name>`, or `""`.
pub fn extract_template_name(html: &str) -> String {
    TEMPLATE_NAME_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default()
}

pub fn extract_caption_text(html: &str) -> String {
    find_element(html, "caption", &[])
        .map(|el| el.text())
        .unwrap_or_default()
}

/// Last ` - `-separated segment of a caption (`"Bout - Real Time"` ->
/// `"Real Time"`). Falls back to the whole caption when that segment is empty.
pub fn extract_caption_suffix(caption: &str) -> String {
    let safe = normalize_text(caption);
    if safe.is_empty() {
        return safe;
    }
    let last = CAPTION_SPLIT_RE
        .split(&safe)
        .last()
        .map(normalize_text)
        .unwrap_or_default();
    if last.is_empty() { safe } else { last }
}

pub fn collect_template_value_cells(html: &str) -> Vec<String> {
    collect_elements(html, "td", &[TEMPLATE_VALUE_CLASS])
        .iter()
        .map(Element::text)
        .collect()
}

pub fn extract_template_value_cell_texts(html: &str) -> Vec<String> {
    collect_template_value_cells(html)
}

/// Raw inner HTML of the first `<td>` in `row_html` carrying `class`.
pub fn extract_cell_html_by_class<'a>(row_html: &'a str, class: &str) -> &'a str {
    if class.trim().is_empty() {
        return "";
    }
    find_element(row_html, "td", &[class])
        .map(|el| el.inner_html)
        .unwrap_or_default()
}

/// Inner HTML of the first `tag` element carrying `class`; any `tag` element
/// when `class` is empty.
pub fn extract_element_inner_html_by_class<'a>(html: &'a str, tag: &str, class: &str) -> &'a str {
    if tag.trim().is_empty() {
        return "";
    }
    let class = [class.trim()];
    let classes = if class[0].is_empty() {
        &class[..0]
    } else {
        &class[..]
    };
    find_element(html, tag.trim(), classes)
        .map(|el| el.inner_html)
        .unwrap_or_default()
}

// ── Rows ────────────────────────────────────────────────────────────────────

/// Label/value pair read from one `<tr>` of a roll template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellRow {
    pub label: String,
    pub value: String,
}

pub fn collect_tr_inner_html_list(html: &str) -> Vec<&str> {
    collect_elements(html, "tr", &[])
        .into_iter()
        .map(|el| el.inner_html)
        .collect()
}

/// Non-empty texts of every `<td>` in a row.
pub fn collect_td_texts(row_html: &str) -> Vec<String> {
    collect_elements(row_html, "td", &[])
        .iter()
        .map(Element::text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// One label per row: the value cell's text, or the label cell's when the
/// value cell is empty. Rows where both are empty are skipped.
pub fn collect_template_rows(html: &str) -> Vec<String> {
    collect_tr_inner_html_list(html)
        .into_iter()
        .filter_map(|row| {
            let value = rendered_text(extract_cell_html_by_class(row, TEMPLATE_VALUE_CLASS));
            let label = if value.is_empty() {
                rendered_text(extract_cell_html_by_class(row, TEMPLATE_LABEL_CLASS))
            } else {
                value
            };
            (!label.is_empty()).then_some(label)
        })
        .collect()
}

pub fn collect_template_rows_with_cells(html: &str) -> Vec<CellRow> {
    collect_tr_inner_html_list(html)
        .into_iter()
        .map(|row| CellRow {
            label: rendered_text(extract_cell_html_by_class(row, TEMPLATE_LABEL_CLASS)),
            value: rendered_text(extract_cell_html_by_class(row, TEMPLATE_VALUE_CLASS)),
        })
        .collect()
}

// ── Numbers ─────────────────────────────────────────────────────────────────

/// Leading integer of every inline roll result span, skipping spans that
/// render no integer.
pub fn collect_inline_roll_span_integers(html: &str) -> Vec<i64> {
    collect_elements(html, "span", &[INLINE_ROLL_CLASS])
        .iter()
        .filter_map(|el| extract_first_integer(&el.text()))
        .collect()
}

/// First integer of the first inline roll inside the first `div.<class>`.
pub fn inline_roll_in_div(html: &str, class: &str) -> Option<i64> {
    let container = find_element(html, "div", &[class])?;
    collect_inline_roll_span_integers(container.inner_html)
        .into_iter()
        .next()
}

/// First integer of the first cell containing `keyword` (case-insensitive).
pub fn find_integer_from_text_by_keyword(cells: &[String], keyword: &str) -> Option<i64> {
    let keyword = keyword.to_lowercase();
    if keyword.is_empty() {
        return None;
    }
    cells
        .iter()
        .filter(|cell| cell.to_lowercase().contains(&keyword))
        .find_map(|cell| extract_first_integer(cell))
}
