use serde::{Deserialize, Serialize};

use crate::entry::Role;
use crate::text::normalize_text;

/// Speaker identity carried from one message to the next.
///
/// Roll20 omits the speaker line on consecutive posts by the same author, so
/// each message is resolved against the context of the one before it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContext {
    pub speaker: String,
    pub avatar_src: String,
    pub speaker_image_url: String,
}

impl MessageContext {
    pub fn new(
        speaker: impl Into<String>,
        avatar_src: impl Into<String>,
        speaker_image_url: impl Into<String>,
    ) -> Self {
        Self {
            speaker: speaker.into(),
            avatar_src: avatar_src.into(),
            speaker_image_url: speaker_image_url.into(),
        }
    }
}

/// Style markers that make a message stand on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InheritOptions {
    pub has_desc_style: bool,
    pub has_emote_style: bool,
    pub has_avatar: bool,
}

/// Collapse whitespace and drop the trailing `:` Roll20 appends to names.
///
/// A name made only of colons is returned as-is.
pub fn normalize_speaker_name(raw: &str) -> String {
    let compact = normalize_text(raw);
    if compact.is_empty() || compact.chars().all(|c| c == ':') {
        return compact;
    }
    compact.trim_end_matches(':').trim().to_string()
}

/// Fill the gaps of `current` from `previous`.
pub fn resolve_message_context(
    current: &MessageContext,
    previous: &MessageContext,
) -> MessageContext {
    let speaker = normalize_speaker_name(&current.speaker);
    let avatar_src = first_non_empty(&[current.avatar_src.trim(), previous.avatar_src.as_str()]);
    let speaker_image_url = first_non_empty(&[
        current.speaker_image_url.trim(),
        previous.speaker_image_url.as_str(),
        avatar_src.as_str(),
    ]);

    MessageContext {
        speaker: if speaker.is_empty() {
            previous.speaker.clone()
        } else {
            speaker
        },
        avatar_src,
        speaker_image_url,
    }
}

/// Desc, emote and avatar-bearing messages never borrow the previous speaker.
pub fn should_inherit_message_context(_role: Role, options: InheritOptions) -> bool {
    !(options.has_desc_style || options.has_emote_style || options.has_avatar)
}

fn first_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .find(|value| !value.is_empty())
        .map(|value| value.to_string())
        .unwrap_or_default()
}
