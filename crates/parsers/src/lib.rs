pub mod avatar;
pub mod coc;
pub mod extract;
pub mod insane;
pub mod message;
pub mod role;
pub mod table;
pub mod text_fallback;
pub mod transcript;

use rollscribe_core::entry::{DicePayload, Role};
use tracing::debug;

pub use avatar::{AvatarMapping, AvatarReplacement, ReplacementMaps, collect_avatar_mappings};
pub use message::{ChatMessage, CollectOptions, MessageView, collect_export_messages};
pub use transcript::{ExportOptions, TranscriptOptions, build_transcript, export_document};

/// Parser for the roll templates of one game system.
pub trait RuleParser: Send + Sync {
    /// Rule name written to `DicePayload::rule` (e.g. "coc7", "insane").
    fn rule(&self) -> &str;

    /// Whether `template` is one of this rule's template keys.
    fn handles(&self, template: &str) -> bool;

    /// Parse a roll-template fragment. `None` when required pieces are missing.
    fn parse(&self, template: &str, html: &str) -> Option<DicePayload>;
}

/// Get all available rule parsers
pub fn all_rule_parsers() -> Vec<Box<dyn RuleParser>> {
    vec![
        Box::new(coc::CocRuleParser),
        Box::new(insane::InsaneRuleParser),
    ]
}

type Attempt = fn(Role, &str, &str) -> Option<DicePayload>;

/// Tried in order; the first `Some` wins.
const ATTEMPTS: &[(&str, Attempt)] = &[
    ("default-table", attempt_default_table),
    ("rule-parser", attempt_rule_parser),
    ("text-check", attempt_text_check),
];

/// Structured dice payload for a message's content fragment.
///
/// Only the `default` table is parsed regardless of role; everything else
/// needs the message to be classified as `Dice`.
pub fn parse_dice_payload(role: Role, html: &str) -> Option<DicePayload> {
    let template = extract::extract_template_name(html);
    for (name, attempt) in ATTEMPTS {
        if let Some(payload) = attempt(role, &template, html) {
            debug!(%template, %role, attempt = name, "parsed dice payload");
            return Some(payload);
        }
    }
    if !template.is_empty() {
        debug!(%template, %role, "no dice payload for template");
    }
    None
}

fn attempt_default_table(_role: Role, template: &str, html: &str) -> Option<DicePayload> {
    (template == table::DEFAULT_TEMPLATE)
        .then(|| table::parse_default_table(html))
        .flatten()
}

fn attempt_rule_parser(role: Role, template: &str, html: &str) -> Option<DicePayload> {
    if role != Role::Dice {
        return None;
    }
    all_rule_parsers()
        .into_iter()
        .find(|parser| parser.handles(template))
        .and_then(|parser| parser.parse(template, html))
}

fn attempt_text_check(role: Role, _template: &str, html: &str) -> Option<DicePayload> {
    if role != Role::Dice {
        return None;
    }
    text_fallback::parse_text_check(html)
}
