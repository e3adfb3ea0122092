//! The `default` roll template: a captioned table of key/value rows.

use rollscribe_core::entry::{DiceInputs, DicePayload, TableRow};

use crate::extract::{collect_td_texts, collect_tr_inner_html_list, extract_caption_text};

pub const RULE: &str = "table";
pub const DEFAULT_TEMPLATE: &str = "default";

/// Caption as title, one `{key, value}` per row with at least two non-empty
/// cells. A caption is required; rows may be empty.
pub fn parse_default_table(html: &str) -> Option<DicePayload> {
    let title = extract_caption_text(html);
    if title.is_empty() {
        return None;
    }

    let rows = collect_tr_inner_html_list(html)
        .into_iter()
        .filter_map(|row| {
            let mut cells = collect_td_texts(row).into_iter();
            let key = cells.next()?;
            let value = cells.next()?;
            Some(TableRow { key, value })
        })
        .collect();

    Some(DicePayload::new(
        RULE,
        DEFAULT_TEMPLATE,
        DiceInputs::Table { title, rows },
    ))
}
