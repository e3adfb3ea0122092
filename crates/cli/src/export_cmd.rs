use anyhow::{Context, Result};
use clap::Args;
use rollscribe_core::export::{
    ExportFormat, render, rewrite_imgur_links, sanitize_filename_base,
};
use rollscribe_parsers::avatar::{ReplacementMaps, parse_replacements};
use rollscribe_parsers::{CollectOptions, ExportOptions, TranscriptOptions, export_document};
use rollscribe_runtime_config::{OutputFormat, RollscribeConfig};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    Json,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => Self::Json,
            FormatArg::Jsonl => Self::Jsonl,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Saved Roll20 chat archive (HTML).
    pub input: PathBuf,
    /// Output file or directory (default stdout).
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Output layout (overrides `[export].format`).
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// Single-line JSON array.
    #[arg(long)]
    pub compact: bool,
    /// Leave imgur page links untouched.
    #[arg(long)]
    pub keep_imgur: bool,
    /// Keep "This message has been hidden" placeholder lines.
    #[arg(long)]
    pub include_hidden: bool,
    /// Avatar replacement JSON file (overrides `[avatars].replacements`).
    #[arg(long)]
    pub replacements: Option<PathBuf>,
    /// Base URL for relative avatar and image links.
    #[arg(long)]
    pub base_url: Option<String>,
}

/// Settings after applying command-line overrides to the config file.
#[derive(Debug, Clone, PartialEq)]
struct EffectiveSettings {
    format: ExportFormat,
    pretty: bool,
    rewrite_imgur: bool,
    skip_hidden_placeholders: bool,
    base_url: String,
    replacements: Option<PathBuf>,
}

impl EffectiveSettings {
    fn resolve(args: &ExportArgs, config: &RollscribeConfig) -> Self {
        let format = args.format.map(OutputFormat::from).unwrap_or(config.export.format);
        let configured_replacements = config.avatars.replacements.trim();
        Self {
            format: match format {
                OutputFormat::Json => ExportFormat::Json,
                OutputFormat::Jsonl => ExportFormat::Jsonl,
            },
            pretty: config.export.pretty && !args.compact,
            rewrite_imgur: config.export.rewrite_imgur && !args.keep_imgur,
            skip_hidden_placeholders: config.export.skip_hidden_placeholders
                && !args.include_hidden,
            base_url: args
                .base_url
                .clone()
                .unwrap_or_else(|| config.avatars.base_url.clone()),
            replacements: args.replacements.clone().or_else(|| {
                (!configured_replacements.is_empty())
                    .then(|| PathBuf::from(configured_replacements))
            }),
        }
    }
}

fn load_replacement_maps(path: &Path, base_url: &str) -> Result<ReplacementMaps> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read avatar replacements {}", path.display()))?;
    let rules = parse_replacements(&content)
        .with_context(|| format!("parse avatar replacements {}", path.display()))?;
    let maps = ReplacementMaps::build(&rules, base_url);
    tracing::debug!(
        rules = rules.len(),
        kept = maps.len(),
        "loaded avatar replacements"
    );
    Ok(maps)
}

/// Output path for `--out`: a directory gets `<input stem>.<ext>` inside it.
fn resolve_output_path(out: &Path, input: &Path, format: ExportFormat) -> PathBuf {
    if !out.is_dir() {
        return out.to_path_buf();
    }
    let stem = input
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or_default();
    out.join(format!(
        "{}.{}",
        sanitize_filename_base(stem),
        format.extension()
    ))
}

pub fn run(args: ExportArgs, config: &RollscribeConfig) -> Result<()> {
    let settings = EffectiveSettings::resolve(&args, config);

    let html = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let maps = settings
        .replacements
        .as_deref()
        .map(|path| load_replacement_maps(path, &settings.base_url))
        .transpose()?;

    let options = ExportOptions {
        collect: CollectOptions {
            skip_hidden_placeholders: settings.skip_hidden_placeholders,
        },
        transcript: TranscriptOptions {
            base_url: &settings.base_url,
            replacements: maps.as_ref(),
        },
    };
    let entries = export_document(&html, &options);

    let mut rendered =
        render(&entries, settings.format, settings.pretty).context("serialize export")?;
    if settings.format == ExportFormat::Json {
        rendered.push('\n');
    }
    if settings.rewrite_imgur {
        rendered = rewrite_imgur_links(&rendered);
    }

    match args.out {
        Some(out) => {
            let path = resolve_output_path(&out, &args.input, settings.format);
            std::fs::write(&path, rendered).with_context(|| format!("write {}", path.display()))?;
            eprintln!("Exported {} messages to {}", entries.len(), path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
