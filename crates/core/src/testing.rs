use crate::entry::{ChatJsonEntry, DicePayload, EntryDraft, Role, build_chat_entry};

/// Plain character line with sequential id.
pub fn entry(speaker: &str, text: &str) -> ChatJsonEntry {
    entry_with_role(speaker, Role::Character, text)
}

pub fn entry_with_role(speaker: &str, role: Role, text: &str) -> ChatJsonEntry {
    build_chat_entry(EntryDraft {
        id: next_id().to_string(),
        speaker: speaker.to_string(),
        role,
        text: text.to_string(),
        ..Default::default()
    })
}

/// Dice line carrying `payload`.
pub fn dice_entry(speaker: &str, text: &str, payload: DicePayload) -> ChatJsonEntry {
    build_chat_entry(EntryDraft {
        id: next_id().to_string(),
        speaker: speaker.to_string(),
        role: Role::Dice,
        text: text.to_string(),
        dice: Some(payload),
        ..Default::default()
    })
}

/// Wrap `inner` in a Roll20 `div.message` with the given extra classes.
pub fn message_html(id: &str, classes: &str, inner: &str) -> String {
    let class_attr = if classes.is_empty() {
        "message".to_string()
    } else {
        format!("message {classes}")
    };
    format!(r#"<div class="{class_attr}" data-messageid="{id}">{inner}</div>"#)
}

/// Roll template table as Roll20 renders it inside a message.
pub fn rolltemplate_html(template: &str, caption: &str, rows: &str) -> String {
    format!(
        r#"<div class="sheet-rolltemplate-{template}"><table><caption>{caption}</caption>{rows}</table></div>"#
    )
}

/// `<tr>` with a label cell and a value cell.
pub fn template_row(label: &str, value: &str) -> String {
    format!(
        r#"<tr><td class="sheet-template_label">{label}</td><td class="sheet-template_value">{value}</td></tr>"#
    )
}

/// Inline roll result span, with the dice breakdown Roll20 keeps in `title`.
pub fn inline_roll(value: i64) -> String {
    format!(
        r#"<span class="inlinerollresult showtip tipsy-n-right" title="Rolling 1d100 = (<span class=&quot;basicdiceroll&quot;>{value}</span>)">{value}</span>"#
    )
}

fn next_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
