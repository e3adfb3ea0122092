//! Exported chat records and the dice payloads attached to them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::omit::omit_nullish;
use crate::text::{normalize_text, to_safe_text};
use crate::timestamp::format_timestamp;

/// Payload schema version written to `DicePayload::v`.
pub const DICE_PAYLOAD_VERSION: u8 = 1;

/// Origin tag written to `DicePayload::source`.
pub const DICE_PAYLOAD_SOURCE: &str = "roll20";

/// Classification of a chat line's origin/visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Character,
    System,
    Secret,
    Dice,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Character, Role::System, Role::Secret, Role::Dice];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::System => "system",
            Self::Secret => "secret",
            Self::Dice => "dice",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural markers found on one message, before precedence is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleFlags {
    pub is_system: bool,
    pub is_secret: bool,
    pub is_dice: bool,
}

impl RoleFlags {
    /// Later checks override earlier ones: dice > secret > system > character.
    pub fn resolve(&self) -> Role {
        let mut role = Role::Character;
        if self.is_system {
            role = Role::System;
        }
        if self.is_secret {
            role = Role::Secret;
        }
        if self.is_dice {
            role = Role::Dice;
        }
        role
    }
}

/// Structured result of one roll template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DicePayload {
    pub v: u8,
    pub source: String,
    pub rule: String,
    pub template: String,
    pub inputs: DiceInputs,
}

impl DicePayload {
    pub fn new(rule: &str, template: &str, inputs: DiceInputs) -> Self {
        Self {
            v: DICE_PAYLOAD_VERSION,
            source: DICE_PAYLOAD_SOURCE.to_string(),
            rule: rule.to_string(),
            template: template.to_string(),
            inputs,
        }
    }
}

/// Template-specific payload body. Serialized without a tag, so each variant
/// becomes the plain object its template defines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiceInputs {
    /// `coc-1`: one percentile check.
    SkillCheck {
        skill: String,
        roll: i64,
        success: i64,
    },
    /// `coc` / `coc-bonus`: a check with one or more dice kept.
    SkillRolls {
        #[serde(skip_serializing_if = "Option::is_none")]
        skill: Option<String>,
        success: i64,
        rolls: Vec<i64>,
    },
    /// `coc-attack` / `coc-attack-1`.
    Attack {
        skill: String,
        success: i64,
        rolls: Vec<i64>,
        damage: i64,
    },
    /// Text-only CoC check recovered from rendered text.
    TextCheck {
        skill: String,
        success: i64,
        roll: i64,
        result: Option<String>,
    },
    /// Titled list of row labels (`coc-dice-roll`, `coc-init-stc`, ...).
    Rows { title: String, rows: Vec<TemplateRow> },
    /// Generic two-column result table.
    Table { title: String, rows: Vec<TableRow> },
    /// Insane skill check against a target number.
    TargetCheck {
        skill: String,
        target: i64,
        roll: i64,
    },
    /// Insane card-like templates (ability, item, emotion, scene, plot).
    Card {
        #[serde(rename = "type")]
        kind: Option<String>,
        title: String,
        detail: Option<String>,
        skill: Option<String>,
        target: Option<i64>,
        roll: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateRow {
    pub label: RowLabel,
}

impl TemplateRow {
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: RowLabel::Text(label.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowLabel {
    Text(String),
    Madness(MadnessLabel),
}

/// Bout-of-madness result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MadnessLabel {
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub key: String,
    pub value: String,
}

/// One exported chat line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatJsonEntry {
    pub id: String,
    pub speaker: String,
    pub role: Role,
    pub text: String,
    pub safetext: String,
    pub timestamp: Option<String>,
    pub text_color: Option<String>,
    pub image_url: Option<String>,
    pub speaker_image_url: Option<String>,
    pub dice: Option<DicePayload>,
}

impl ChatJsonEntry {
    /// Serialized form with every `null` removed, at any depth.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self)
            .ok()
            .and_then(omit_nullish)
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

/// Raw material for one entry, as gathered by the transcript pass.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub id: String,
    pub speaker: String,
    pub role: Role,
    pub text: String,
    pub timestamp: Option<String>,
    pub text_color: Option<String>,
    pub image_url: Option<String>,
    pub speaker_image_url: Option<String>,
    pub dice: Option<DicePayload>,
}

/// Compose the exportable record for one message.
pub fn build_chat_entry(draft: EntryDraft) -> ChatJsonEntry {
    let safetext = to_safe_text(&draft.text);
    ChatJsonEntry {
        id: draft.id,
        speaker: draft.speaker,
        role: draft.role,
        text: draft.text,
        safetext,
        timestamp: draft
            .timestamp
            .map(|raw| format_timestamp(&raw))
            .filter(|value| !value.is_empty()),
        text_color: non_empty(draft.text_color),
        image_url: non_empty(draft.image_url),
        speaker_image_url: non_empty(draft.speaker_image_url),
        dice: draft.dice,
    }
}

/// Explicit message id when present, else the 1-based document position.
pub fn resolve_message_id(explicit: Option<&str>, index: usize) -> String {
    match explicit.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => (index + 1).to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| normalize_text(&raw))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::omit::find_null_paths;
    use serde_json::json;

    fn draft(text: &str) -> EntryDraft {
        EntryDraft {
            id: "12".to_string(),
            speaker: "Alice".to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_role_flag_precedence() {
        assert_eq!(RoleFlags::default().resolve(), Role::Character);
        let system = RoleFlags {
            is_system: true,
            ..Default::default()
        };
        assert_eq!(system.resolve(), Role::System);
        let secret = RoleFlags {
            is_system: true,
            is_secret: true,
            ..Default::default()
        };
        assert_eq!(secret.resolve(), Role::Secret);
        let dice = RoleFlags {
            is_system: true,
            is_secret: true,
            is_dice: true,
        };
        assert_eq!(dice.resolve(), Role::Dice);
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::from_label(" Dice "), Some(Role::Dice));
        assert_eq!(Role::from_label("npc"), None);
        assert_eq!(serde_json::to_value(Role::Secret).unwrap(), json!("secret"));
    }

    #[test]
    fn test_build_chat_entry_maps_required_keys() {
        let mut input = draft("Hi!! 😀");
        input.speaker_image_url = Some("https://example.com/a.png".to_string());
        input.timestamp = Some("3:45 PM".to_string());
        let entry = build_chat_entry(input);

        assert_eq!(
            entry.to_value(),
            json!({
                "id": "12",
                "speaker": "Alice",
                "role": "character",
                "text": "Hi!! 😀",
                "safetext": "Hi!!",
                "timestamp": "오후 3:45",
                "speakerImageUrl": "https://example.com/a.png"
            })
        );
    }

    #[test]
    fn test_build_chat_entry_drops_empty_optionals() {
        let mut input = draft("hello");
        input.image_url = Some("  ".to_string());
        input.text_color = Some(String::new());
        input.timestamp = Some(" ".to_string());
        let value = build_chat_entry(input).to_value();
        let object = value.as_object().expect("object");
        for key in ["imageUrl", "textColor", "timestamp", "speakerImageUrl", "dice"] {
            assert!(!object.contains_key(key), "{key} should be omitted");
        }
    }

    #[test]
    fn test_dice_inputs_nulls_are_omitted() {
        let mut input = draft("card");
        input.role = Role::Dice;
        input.dice = Some(DicePayload::new(
            "insane",
            "emotion",
            DiceInputs::Card {
                kind: Some("감정".to_string()),
                title: "애정".to_string(),
                detail: None,
                skill: None,
                target: None,
                roll: None,
            },
        ));
        let value = build_chat_entry(input).to_value();
        assert!(find_null_paths(&value).is_empty());
        assert_eq!(
            value["dice"],
            json!({
                "v": 1,
                "source": "roll20",
                "rule": "insane",
                "template": "emotion",
                "inputs": {"type": "감정", "title": "애정"}
            })
        );
    }

    #[test]
    fn test_resolve_message_id() {
        assert_eq!(resolve_message_id(Some("abc"), 3), "abc");
        assert_eq!(resolve_message_id(Some("  "), 3), "4");
        assert_eq!(resolve_message_id(None, 0), "1");
    }
}
