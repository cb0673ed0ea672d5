use super::Config;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Reads and validates a TOML configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or holds
/// values that fail validation.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
}

/// Parses configuration from an in-memory TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or validation fails.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse TOML config")?;

    // Validation errors are returned as-is so the message stays readable
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    let interval = config.core.scan_interval()?;
    if interval.is_zero() {
        anyhow::bail!("Scan interval must be greater than zero");
    }

    if config.scan.extensions.is_empty() {
        anyhow::bail!("At least one media extension must be configured");
    }

    if let Some(bad) = config
        .scan
        .extensions
        .iter()
        .find(|ext| !ext.starts_with('.') || ext.len() < 2)
    {
        anyhow::bail!("Extensions must look like '.mkv', got: {bad}");
    }

    let lib = &config.library;
    let buckets = [
        lib.movie_folder.as_str(),
        lib.tv_folder.as_str(),
        lib.anime_movie_folder.as_str(),
        lib.anime_tv_folder.as_str(),
    ];
    if buckets.iter().any(|b| b.trim().is_empty()) {
        anyhow::bail!("Library folder names cannot be empty");
    }

    // Movie and TV must never share a bucket; anime buckets may alias them
    // when separation is disabled.
    if lib.movie_folder == lib.tv_folder {
        anyhow::bail!("Movie and TV folders must differ");
    }
    if lib.anime_separation {
        let unique: HashSet<&str> = buckets.iter().copied().collect();
        if unique.len() != buckets.len() {
            anyhow::bail!("Library folders must be distinct when anime separation is enabled");
        }
    }

    Ok(())
}
