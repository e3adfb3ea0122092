//! Exporter configuration types.
//!
//! `rollscribe` reads `rollscribe.toml` using these types. File lookup and
//! command-line overrides live in the CLI crate.

use serde::{Deserialize, Serialize};

/// Canonical config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "rollscribe.toml";

/// Base URL Roll20 chat archives are saved from.
pub const DEFAULT_BASE_URL: &str = "https://app.roll20.net";

/// Top-level configuration (persisted as `rollscribe.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RollscribeConfig {
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub avatars: AvatarSettings,
}

impl RollscribeConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportSettings {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_true")]
    pub pretty: bool,
    /// Point imgur page links at the direct image host.
    #[serde(default = "default_true")]
    pub rewrite_imgur: bool,
    /// Drop Roll20's "This message has been hidden" placeholder lines.
    #[serde(default = "default_true")]
    pub skip_hidden_placeholders: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
            rewrite_imgur: true,
            skip_hidden_placeholders: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Jsonl,
}

impl OutputFormat {
    pub fn display(&self) -> &'static str {
        match self {
            Self::Json => "JSON array",
            Self::Jsonl => "JSON Lines",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvatarSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path to an avatar replacement JSON file. Empty disables replacement.
    #[serde(default)]
    pub replacements: String,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            replacements: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
