use anyhow::{Context, Result, bail};
use rollscribe_runtime_config::{CONFIG_FILE_NAME, RollscribeConfig};
use std::path::{Path, PathBuf};

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// `--config <path>` when given (must exist), else `./rollscribe.toml` when
/// present, else built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<(RollscribeConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        let config = read_config(&local)?;
        return Ok((config, ConfigSource::File(local)));
    }

    Ok((RollscribeConfig::default(), ConfigSource::Defaults))
}

fn read_config(path: &Path) -> Result<RollscribeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    RollscribeConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))
}

/// Print the effective configuration as TOML.
pub fn show_config(config: &RollscribeConfig, source: &ConfigSource) -> Result<()> {
    match source {
        ConfigSource::File(path) => println!("# loaded from {}", path.display()),
        ConfigSource::Defaults => println!("# built-in defaults (no {CONFIG_FILE_NAME} found)"),
    }
    let content = config.to_toml().context("Failed to serialize config")?;
    print!("{content}");
    Ok(())
}

/// Write a default `rollscribe.toml` into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let content = RollscribeConfig::default()
        .to_toml()
        .context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(path)
}
