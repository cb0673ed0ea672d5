use crate::config::Config;
use crate::{ShelfContext, output};
use anyhow::Result;
use colored::Colorize;

/// Get, set or list configuration values
///
/// # Errors
///
/// Returns an error if:
/// - The key is unknown or the value is invalid
/// - The configuration cannot be saved
pub fn execute(ctx: &mut ShelfContext, key: Option<&str>, value: Option<String>, list: bool) -> Result<()> {
    let Some(key) = key.filter(|_| !list) else {
        show_all_config(&ctx.config);
        return Ok(());
    };

    if let Some(val) = value {
        ctx.config.set(key, val.clone())?;
        ctx.config.save(&ctx.config_path)?;
        output::success(&format!("Set {key} = {val}"));
    } else if let Some(val) = ctx.config.get(key) {
        println!("{val}");
    } else {
        anyhow::bail!("Unknown configuration key: {key}");
    }

    Ok(())
}

/// Prints every key grouped by section
fn show_all_config(config: &Config) {
    let mut current_section = "";
    for key in Config::KEYS {
        let Some((section, field)) = key.split_once('.') else {
            continue;
        };
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("{}", format!("[{section}]").bold());
            current_section = section;
        }
        println!("  {field} = {}", config.get(key).unwrap_or_default());
    }
}
