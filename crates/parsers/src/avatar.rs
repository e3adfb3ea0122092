//! Speaker avatar replacement rules.
//!
//! Roll20 serves avatars from short-lived `/users/avatar/<id>/<size>` paths.
//! A replacement file maps `(speaker, original avatar)` to a stable image URL;
//! the maps built here are owned by one export run and only consulted, never
//! filled, during the transcript pass.

use regex::Regex;
use rollscribe_core::context::normalize_speaker_name;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

use crate::message::{ChatMessage, MessageView};

pub const ROLL20_BASE_URL: &str = "https://app.roll20.net";

static AVATAR_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/users/avatar/[^/]+/\d+").unwrap());

static ALLOWED_IMAGE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(https?://|data:image/)").unwrap());

/// One user-authored rule, as stored in the replacement JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarReplacement {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub original_url: String,
    #[serde(default)]
    pub new_url: String,
}

/// A `(speaker, avatar)` pair seen in a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarMapping {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub original_url: String,
}

pub fn parse_replacements(json: &str) -> Result<Vec<AvatarReplacement>, serde_json::Error> {
    serde_json::from_str(json)
}

pub fn is_avatar_path_url(url: &str) -> bool {
    AVATAR_PATH_RE.is_match(url)
}

pub fn is_allowed_image_url(url: &str) -> bool {
    ALLOWED_IMAGE_URL_RE.is_match(url.trim())
}

/// Resolve `url` against `base`. Returns `""` for empty or unparsable input.
pub fn to_absolute_url(base: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    match Url::parse(url) {
        Ok(absolute) => absolute.into(),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|base| base.join(url))
            .map(String::from)
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplacementMaps {
    base_url: String,
    by_pair: HashMap<(String, String), String>,
    by_original: HashMap<String, String>,
}

impl ReplacementMaps {
    /// Keep rules that name a speaker, point at a Roll20 avatar path and
    /// replace it with an http(s) or `data:image/` URL.
    ///
    /// For a repeated pair the last rule wins; for the original-only lookup
    /// the first rule wins.
    pub fn build(replacements: &[AvatarReplacement], base_url: &str) -> Self {
        let mut maps = Self {
            base_url: base_url.to_string(),
            ..Default::default()
        };

        for item in replacements {
            let name = normalize_speaker_name(&item.name);
            let original = to_absolute_url(base_url, &item.original_url);
            let new_url = item.new_url.trim();
            if name.is_empty()
                || !is_avatar_path_url(&original)
                || new_url.is_empty()
                || !is_allowed_image_url(new_url)
            {
                warn!(
                    name = %item.name,
                    original_url = %item.original_url,
                    "discarding avatar replacement rule"
                );
                continue;
            }
            maps.by_pair
                .insert((name, original.clone()), new_url.to_string());
            maps.by_original
                .entry(original)
                .or_insert_with(|| new_url.to_string());
        }

        maps
    }

    /// Replacement for a message by `name` whose avatar is `current_src`:
    /// exact pair first, then any rule for the same original image.
    pub fn find(&self, name: &str, current_src: &str) -> Option<&str> {
        let name = normalize_speaker_name(name);
        let current = to_absolute_url(&self.base_url, current_src);
        if name.is_empty() || current.is_empty() {
            return None;
        }
        self.by_pair
            .get(&(name, current.clone()))
            .or_else(|| self.by_original.get(&current))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}

/// Unique `(speaker, avatar)` pairs in document order, for authoring a
/// replacement file. Messages without a speaker line or avatar are skipped.
pub fn collect_avatar_mappings(messages: &[ChatMessage], base_url: &str) -> Vec<AvatarMapping> {
    let mut seen = HashSet::new();
    let mut mappings = Vec::new();

    for message in messages {
        let view = MessageView::read(message);
        let name = normalize_speaker_name(view.speaker());
        let src = to_absolute_url(base_url, view.avatar_src());
        if name.is_empty() || src.is_empty() {
            continue;
        }
        let id = format!("{name}|||{src}");
        if !seen.insert(id.clone()) {
            continue;
        }
        mappings.push(AvatarMapping {
            id,
            name,
            avatar_url: src.clone(),
            original_url: src,
        });
    }

    mappings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, original: &str, new_url: &str) -> AvatarReplacement {
        AvatarReplacement {
            name: name.to_string(),
            original_url: original.to_string(),
            new_url: new_url.to_string(),
        }
    }

    #[test]
    fn test_to_absolute_url() {
        assert_eq!(
            to_absolute_url(ROLL20_BASE_URL, "/users/avatar/3307646/30"),
            "https://app.roll20.net/users/avatar/3307646/30"
        );
        assert_eq!(
            to_absolute_url(ROLL20_BASE_URL, "https://files.d20.io/images/a.png?size=30"),
            "https://files.d20.io/images/a.png?size=30"
        );
        assert_eq!(to_absolute_url(ROLL20_BASE_URL, "  "), "");
        assert_eq!(to_absolute_url("not a base", "/relative"), "");
    }

    #[test]
    fn test_build_keeps_only_avatar_path_rules() {
        let maps = ReplacementMaps::build(
            &[
                rule(
                    "Alice",
                    "/users/avatar/3307646/30",
                    "https://files.d20.io/images/new-thumb.png?size=30",
                ),
                rule(
                    "Bob",
                    "https://example.com/not-avatar.png",
                    "https://files.d20.io/images/other.png",
                ),
            ],
            ROLL20_BASE_URL,
        );
        assert_eq!(maps.len(), 1);
        assert_eq!(
            maps.find("Alice:", "https://app.roll20.net/users/avatar/3307646/30"),
            Some("https://files.d20.io/images/new-thumb.png?size=30")
        );
        assert_eq!(maps.find("Bob", "https://example.com/not-avatar.png"), None);
    }

    #[test]
    fn test_find_prefers_pair_then_original() {
        let maps = ReplacementMaps::build(
            &[
                rule(
                    "Alice",
                    "/users/avatar/3307646/30",
                    "https://files.d20.io/images/alice.png",
                ),
                rule(
                    "Carol",
                    "/users/avatar/3307646/30",
                    "https://files.d20.io/images/shared.png",
                ),
            ],
            ROLL20_BASE_URL,
        );
        assert_eq!(
            maps.find("Carol", "/users/avatar/3307646/30"),
            Some("https://files.d20.io/images/shared.png")
        );
        assert_eq!(
            maps.find("Unknown", "/users/avatar/3307646/30"),
            Some("https://files.d20.io/images/alice.png")
        );
        assert_eq!(maps.find("", "/users/avatar/3307646/30"), None);
        assert_eq!(maps.find("Alice", ""), None);
    }

    #[test]
    fn test_build_rejects_non_image_urls() {
        let maps = ReplacementMaps::build(
            &[
                rule("Alice", "/users/avatar/3307646/30", "javascript:alert(1)"),
                rule("Alice", "/users/avatar/3307646/30", "  "),
                rule("", "/users/avatar/3307646/30", "https://x/y.png"),
            ],
            ROLL20_BASE_URL,
        );
        assert!(maps.is_empty());
    }

    #[test]
    fn test_data_image_urls_allowed() {
        let maps = ReplacementMaps::build(
            &[rule(
                "Alice",
                "/users/avatar/1/30",
                "data:image/png;base64,AAAA",
            )],
            ROLL20_BASE_URL,
        );
        assert_eq!(
            maps.find("Alice", "/users/avatar/1/30"),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn test_parse_replacements_file() {
        let json = r#"[{"name":"Alice","originalUrl":"/users/avatar/1/30","newUrl":"https://x/a.png"},{"name":"Bob"}]"#;
        let rules = parse_replacements(json).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].new_url, "https://x/a.png");
        assert_eq!(rules[1].original_url, "");
        assert!(parse_replacements("{").is_err());
    }

    #[test]
    fn test_collect_avatar_mappings_dedupes_pairs() {
        let avatar = r#"<div class="avatar"><img src="/users/avatar/7/30"></div>"#;
        let messages = vec![
            ChatMessage::new(
                Some("a"),
                format!(r#"<div class="message">{avatar}<span class="by">Alice:</span>hi</div>"#),
            ),
            ChatMessage::new(
                Some("b"),
                format!(r#"<div class="message">{avatar}<span class="by">Alice:</span>again</div>"#),
            ),
            ChatMessage::new(
                Some("c"),
                r#"<div class="message"><span class="by">NoAvatar:</span>x</div>"#,
            ),
        ];
        let mappings = collect_avatar_mappings(&messages, ROLL20_BASE_URL);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].name, "Alice");
        assert_eq!(
            mappings[0].original_url,
            "https://app.roll20.net/users/avatar/7/30"
        );
        assert_eq!(
            mappings[0].id,
            "Alice|||https://app.roll20.net/users/avatar/7/30"
        );
    }
}
