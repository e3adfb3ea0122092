//! Message handles and the per-message reader.
//!
//! A [`ChatMessage`] is the outer HTML of one Roll20 `div.message`. The
//! transcript pass never touches the document again after collection; every
//! field it needs is read from the handle through [`MessageView`].

use rollscribe_core::context::InheritOptions;
use rollscribe_core::entry::{Role, RoleFlags};
use rollscribe_core::text::{escape_html, is_hidden_message_placeholder_text, normalize_text};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::role::{child_elements, collect_role_flags, contains_any_class, speaker_span};

static MESSAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.message").unwrap());
static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());
static TSTAMP_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.tstamp").unwrap());

/// Children that frame a message rather than carry its content.
const CHROME_CLASSES: &[&str] = &["spacer", "avatar", "tstamp", "by"];
const DESC_CLASSES: &[&str] = &["desc"];
const EMOTE_CLASSES: &[&str] = &["emote", "em", "emas"];
const BLOCK_TAGS: &[&str] = &[
    "br", "caption", "div", "li", "p", "table", "td", "th", "tr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// `data-messageid` of the element, when present.
    pub id: Option<String>,
    pub html: String,
}

impl ChatMessage {
    pub fn new(id: Option<&str>, html: impl Into<String>) -> Self {
        Self {
            id: id.map(str::to_string),
            html: html.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectOptions {
    /// Drop messages showing Roll20's "hidden message" placeholder.
    pub skip_hidden_placeholders: bool,
}

/// Every exportable `div.message` in document order.
///
/// Messages hidden with an inline `display: none` are skipped, as are
/// placeholder lines when `options` asks for it.
pub fn collect_export_messages(document_html: &str, options: CollectOptions) -> Vec<ChatMessage> {
    let document = Html::parse_document(document_html);
    let mut messages = Vec::new();

    for (position, el) in document.select(&MESSAGE_SELECTOR).enumerate() {
        let id = el.value().attr("data-messageid");
        if is_display_none(el) {
            debug!(position, ?id, "skipping message hidden by inline style");
            continue;
        }
        if options.skip_hidden_placeholders
            && is_hidden_message_placeholder_text(&el.text().collect::<String>())
        {
            debug!(position, ?id, "skipping hidden-message placeholder");
            continue;
        }
        messages.push(ChatMessage::new(id, el.html()));
    }

    messages
}

fn is_display_none(el: ElementRef<'_>) -> bool {
    el.value()
        .attr("style")
        .and_then(|style| style_declaration(style, "display"))
        .is_some_and(|display| display.eq_ignore_ascii_case("none"))
}

/// Value of `property` in an inline `style` attribute. The last declaration
/// wins; `!important` is dropped.
pub fn style_declaration(style: &str, property: &str) -> Option<String> {
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_suffix("!important")
                .unwrap_or(value)
                .trim()
                .to_string()
        })
        .filter(|value| !value.is_empty())
        .next_back()
}

/// Everything the transcript pass reads from one message.
#[derive(Debug, Clone, Default)]
pub struct MessageView {
    flags: RoleFlags,
    speaker: String,
    avatar_src: String,
    timestamp: String,
    text_color: String,
    text: String,
    content_html: String,
    image_src: String,
    inherit: InheritOptions,
}

impl MessageView {
    /// Parse a handle. A fragment without a `div.message` root is read as
    /// plain content.
    pub fn read(message: &ChatMessage) -> Self {
        let fragment = Html::parse_fragment(&message.html);
        match fragment.select(&MESSAGE_SELECTOR).next() {
            Some(el) => Self::from_element(el),
            None => {
                let root = fragment.root_element();
                let mut text = String::new();
                push_text(root, &mut text);
                Self {
                    text: normalize_text(&text),
                    content_html: root.inner_html(),
                    ..Default::default()
                }
            }
        }
    }

    fn from_element(el: ElementRef<'_>) -> Self {
        let avatar_src = child_elements(el)
            .filter(|child| child.value().classes().any(|class| class == "avatar"))
            .find_map(|avatar| avatar.select(&IMG_SELECTOR).next())
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let mut text = String::new();
        let mut content_html = String::new();
        let mut image_src = String::new();
        for child in el.children() {
            if let Some(node_text) = child.value().as_text() {
                text.push_str(node_text);
                content_html.push_str(&escape_html(node_text));
                continue;
            }
            let Some(child_el) = ElementRef::wrap(child) else {
                continue;
            };
            if child_el
                .value()
                .classes()
                .any(|class| CHROME_CLASSES.contains(&class))
            {
                continue;
            }
            push_text(child_el, &mut text);
            content_html.push_str(&child_el.html());
            if image_src.is_empty()
                && let Some(src) = first_image_src(child_el)
            {
                image_src = src;
            }
        }

        Self {
            flags: collect_role_flags(el),
            speaker: speaker_span(el)
                .map(|by| normalize_text(&by.text().collect::<String>()))
                .unwrap_or_default(),
            timestamp: el
                .select(&TSTAMP_SELECTOR)
                .next()
                .map(|tstamp| normalize_text(&tstamp.text().collect::<String>()))
                .unwrap_or_default(),
            text_color: el
                .value()
                .attr("style")
                .and_then(|style| style_declaration(style, "color"))
                .unwrap_or_default(),
            text: normalize_text(&text),
            content_html,
            image_src,
            inherit: InheritOptions {
                has_desc_style: contains_any_class(el, DESC_CLASSES),
                has_emote_style: contains_any_class(el, EMOTE_CLASSES),
                has_avatar: !avatar_src.is_empty(),
            },
            avatar_src,
        }
    }

    pub fn role(&self) -> Role {
        self.flags.resolve()
    }

    pub fn flags(&self) -> RoleFlags {
        self.flags
    }

    /// Raw speaker line (`span.by`), trailing colon included.
    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    /// `src` of the message's own avatar image, as written in the markup.
    pub fn avatar_src(&self) -> &str {
        &self.avatar_src
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn text_color(&self) -> &str {
        &self.text_color
    }

    /// Normalized visible text without speaker, timestamp, avatar or spacer.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The same content re-serialized as HTML; input to dice parsing.
    pub fn content_html(&self) -> &str {
        &self.content_html
    }

    /// First content image, as written in the markup.
    pub fn image_src(&self) -> &str {
        &self.image_src
    }

    pub fn inherit_options(&self) -> InheritOptions {
        self.inherit
    }
}

fn first_image_src(el: ElementRef<'_>) -> Option<String> {
    let own = (el.value().name() == "img")
        .then(|| el.value().attr("src"))
        .flatten();
    own.or_else(|| {
        el.select(&IMG_SELECTOR)
            .next()
            .and_then(|img| img.value().attr("src"))
    })
    .map(str::trim)
    .filter(|src| !src.is_empty())
    .map(str::to_string)
}

/// Text content with a space at block boundaries, so table cells and
/// paragraphs do not run together.
fn push_text(el: ElementRef<'_>, out: &mut String) {
    let block = BLOCK_TAGS.contains(&el.value().name());
    if block {
        out.push(' ');
    }
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            push_text(child_el, out);
        }
    }
    if block {
        out.push(' ');
    }
}
