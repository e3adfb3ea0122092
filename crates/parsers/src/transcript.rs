//! The transcript pass: message handles in, export entries out.

use rollscribe_core::context::{
    MessageContext, resolve_message_context, should_inherit_message_context,
};
use rollscribe_core::entry::{ChatJsonEntry, EntryDraft, build_chat_entry, resolve_message_id};
use tracing::debug;

use crate::avatar::{ROLL20_BASE_URL, ReplacementMaps, is_allowed_image_url, to_absolute_url};
use crate::message::{ChatMessage, CollectOptions, MessageView, collect_export_messages};
use crate::parse_dice_payload;

#[derive(Debug, Clone, Copy)]
pub struct TranscriptOptions<'a> {
    /// Base for relative avatar and image URLs.
    pub base_url: &'a str,
    pub replacements: Option<&'a ReplacementMaps>,
}

impl Default for TranscriptOptions<'_> {
    fn default() -> Self {
        Self {
            base_url: ROLL20_BASE_URL,
            replacements: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions<'a> {
    pub collect: CollectOptions,
    pub transcript: TranscriptOptions<'a>,
}

/// One entry per message, in input order.
///
/// Speaker context starts empty on every call and is carried from each
/// message to the next. Messages with their own desc/emote styling or avatar
/// are resolved without the carried context.
pub fn build_transcript(
    messages: &[ChatMessage],
    options: &TranscriptOptions<'_>,
) -> Vec<ChatJsonEntry> {
    let fresh = MessageContext::default();
    let mut previous = MessageContext::default();
    let mut entries = Vec::with_capacity(messages.len());

    for (index, message) in messages.iter().enumerate() {
        let view = MessageView::read(message);
        let role = view.role();

        let avatar_src = to_absolute_url(options.base_url, view.avatar_src());
        let replaced = options
            .replacements
            .and_then(|maps| maps.find(view.speaker(), &avatar_src))
            .unwrap_or_default()
            .to_string();
        let current = MessageContext::new(view.speaker(), avatar_src, replaced);

        let inherit = should_inherit_message_context(role, view.inherit_options());
        let context = resolve_message_context(&current, if inherit { &previous } else { &fresh });

        let image_url = to_absolute_url(options.base_url, view.image_src());
        entries.push(build_chat_entry(EntryDraft {
            id: resolve_message_id(message.id.as_deref(), index),
            speaker: context.speaker.clone(),
            role,
            text: view.text().to_string(),
            timestamp: Some(view.timestamp().to_string()),
            text_color: Some(view.text_color().to_string()),
            image_url: is_allowed_image_url(&image_url).then_some(image_url),
            speaker_image_url: Some(context.speaker_image_url.clone()),
            dice: parse_dice_payload(role, view.content_html()),
        }));

        previous = context;
    }

    entries
}

/// Collect the messages of a saved chat document and build its transcript.
pub fn export_document(document_html: &str, options: &ExportOptions<'_>) -> Vec<ChatJsonEntry> {
    let messages = collect_export_messages(document_html, options.collect);
    let entries = build_transcript(&messages, &options.transcript);
    debug!(
        messages = messages.len(),
        dice = entries.iter().filter(|entry| entry.dice.is_some()).count(),
        "built transcript"
    );
    entries
}
