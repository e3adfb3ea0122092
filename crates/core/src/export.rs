//! Serialization of finished transcripts.
//!
//! Entries are written as a JSON array or as JSONL (one entry per line).
//! Every entry goes through [`ChatJsonEntry::to_value`] first, so no `null`
//! reaches the output.

use regex::Regex;
use serde_json::Value;
use std::io::{self, Write};
use std::sync::LazyLock;

use crate::entry::ChatJsonEntry;

static IMGUR_PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://(?:www\.)?imgur\.com/").unwrap());

const IMGUR_DIRECT_PREFIX: &str = "https://i.imgur.com/";

/// File name used when a title sanitizes to nothing.
pub const DEFAULT_FILENAME_BASE: &str = "roll20-chat";

const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error at entry {index}: {source}")]
    Json {
        index: usize,
        source: serde_json::Error,
    },
}

/// Output layout of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Jsonl,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
        }
    }
}

pub fn entries_to_values(entries: &[ChatJsonEntry]) -> Vec<Value> {
    entries.iter().map(ChatJsonEntry::to_value).collect()
}

/// Serialize entries as one JSON array.
pub fn to_json_string(entries: &[ChatJsonEntry], pretty: bool) -> Result<String, ExportError> {
    let values = Value::Array(entries_to_values(entries));
    let result = if pretty {
        serde_json::to_string_pretty(&values)
    } else {
        serde_json::to_string(&values)
    };
    result.map_err(|source| ExportError::Json { index: 0, source })
}

/// Write one entry per line.
pub fn write_jsonl<W: Write>(entries: &[ChatJsonEntry], mut writer: W) -> Result<(), ExportError> {
    for (index, entry) in entries.iter().enumerate() {
        serde_json::to_writer(&mut writer, &entry.to_value())
            .map_err(|source| ExportError::Json { index, source })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize in the requested format into a string.
pub fn render(
    entries: &[ChatJsonEntry],
    format: ExportFormat,
    pretty: bool,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => to_json_string(entries, pretty),
        ExportFormat::Jsonl => {
            let mut buf = Vec::new();
            write_jsonl(entries, &mut buf)?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        }
    }
}

/// Point imgur page links at the direct-image host.
///
/// Operates on serialized text; call it once on the final output.
pub fn rewrite_imgur_links(serialized: &str) -> String {
    IMGUR_PAGE_RE
        .replace_all(serialized, IMGUR_DIRECT_PREFIX)
        .into_owned()
}

/// Make a chat title usable as a file name.
pub fn sanitize_filename_base(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !FORBIDDEN_FILENAME_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        DEFAULT_FILENAME_BASE.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryDraft, Role, build_chat_entry};
    use crate::testing::{entry, entry_with_role};

    fn entries() -> Vec<ChatJsonEntry> {
        vec![
            build_chat_entry(EntryDraft {
                id: "1".to_string(),
                speaker: "KP".to_string(),
                text: "hello".to_string(),
                speaker_image_url: Some("https://imgur.com/abc.png".to_string()),
                ..Default::default()
            }),
            build_chat_entry(EntryDraft {
                id: "2".to_string(),
                speaker: "KP".to_string(),
                text: "again".to_string(),
                ..Default::default()
            }),
        ]
    }

    #[test]
    fn test_to_json_string_omits_nulls() {
        let json = to_json_string(&entries(), false).unwrap();
        assert!(!json.contains("null"));
        assert!(json.starts_with(r#"[{"id":"1","speaker":"KP","role":"character""#));
    }

    #[test]
    fn test_write_jsonl_one_entry_per_line() {
        let entries = vec![
            entry("KP", "hello"),
            entry_with_role("KP", Role::Secret, "again"),
        ];
        let mut buf = Vec::new();
        write_jsonl(&entries, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["text"], "again");
        assert_eq!(second["role"], "secret");
    }

    #[test]
    fn test_write_jsonl_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        let file = std::fs::File::create(&path).unwrap();
        write_jsonl(&entries(), file).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_rewrite_imgur_links() {
        let input = r#"{"a":"https://imgur.com/x.png","b":"http://www.imgur.com/y","c":"https://i.imgur.com/z"}"#;
        assert_eq!(
            rewrite_imgur_links(input),
            r#"{"a":"https://i.imgur.com/x.png","b":"https://i.imgur.com/y","c":"https://i.imgur.com/z"}"#
        );
    }

    #[test]
    fn test_rewrite_imgur_links_applied_to_export() {
        let json = rewrite_imgur_links(&to_json_string(&entries(), false).unwrap());
        assert!(json.contains("https://i.imgur.com/abc.png"));
    }

    #[test]
    fn test_sanitize_filename_base() {
        assert_eq!(sanitize_filename_base("My: Campaign / 3?"), "My Campaign 3");
        assert_eq!(sanitize_filename_base("<>|*"), DEFAULT_FILENAME_BASE);
        assert_eq!(sanitize_filename_base("  "), DEFAULT_FILENAME_BASE);
    }

    #[test]
    fn test_render_formats() {
        let json = render(&entries(), ExportFormat::Json, true).unwrap();
        assert!(json.starts_with("[\n"));
        let jsonl = render(&entries(), ExportFormat::Jsonl, false).unwrap();
        assert_eq!(jsonl.lines().count(), 2);
        assert_eq!(ExportFormat::Jsonl.extension(), "jsonl");
    }
}
