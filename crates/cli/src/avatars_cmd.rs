use anyhow::{Context, Result};
use clap::Args;
use rollscribe_parsers::avatar::AvatarReplacement;
use rollscribe_parsers::{CollectOptions, collect_avatar_mappings, collect_export_messages};
use rollscribe_runtime_config::RollscribeConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct AvatarsArgs {
    /// Saved Roll20 chat archive (HTML).
    pub input: PathBuf,
    /// Emit a replacement file skeleton (`newUrl` left empty) instead of the
    /// raw speaker/avatar pairs.
    #[arg(long)]
    pub template: bool,
    /// Base URL for relative avatar links.
    #[arg(long)]
    pub base_url: Option<String>,
}

pub fn run(args: AvatarsArgs, config: &RollscribeConfig) -> Result<()> {
    let html = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let base_url = args
        .base_url
        .as_deref()
        .unwrap_or(&config.avatars.base_url);

    let messages = collect_export_messages(
        &html,
        CollectOptions {
            skip_hidden_placeholders: config.export.skip_hidden_placeholders,
        },
    );
    let mappings = collect_avatar_mappings(&messages, base_url);

    let output = if args.template {
        let skeleton: Vec<AvatarReplacement> = mappings
            .into_iter()
            .map(|mapping| AvatarReplacement {
                name: mapping.name,
                original_url: mapping.original_url,
                new_url: String::new(),
            })
            .collect();
        serde_json::to_string_pretty(&skeleton)
    } else {
        serde_json::to_string_pretty(&mappings)
    }
    .context("serialize avatar mappings")?;

    println!("{output}");
    Ok(())
}
