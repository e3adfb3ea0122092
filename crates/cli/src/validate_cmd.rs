use anyhow::{Context, Result, bail};
use rollscribe_core::validate::validate_entries;
use serde_json::Value;
use std::path::Path;

/// Parse an export file: a JSON array, or one object per line.
fn read_export(path: &Path) -> Result<Vec<Value>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content)
            .with_context(|| format!("parse JSON array {}", path.display()));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), index + 1))
        })
        .collect()
}

pub fn run(path: &Path) -> Result<()> {
    let values = read_export(path)?;
    match validate_entries(&values) {
        Ok(()) => {
            println!("{}: {} entries OK", path.display(), values.len());
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("- {error}");
            }
            bail!(
                "{} validation error(s) in {}",
                errors.len(),
                path.display()
            )
        }
    }
}
