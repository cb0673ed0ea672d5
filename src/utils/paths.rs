use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Ensures parent directories exist for a given path
///
/// # Errors
///
/// Returns an error if the parent directories cannot be created
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create parent directories for {}", path.display())
        })?;
    }
    Ok(())
}

/// Expands tilde in path to home directory
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Some(path_str) = path.to_str() else {
        return Ok(path.to_path_buf());
    };

    if path_str == "~" {
        return dirs::home_dir().context("Could not find home directory");
    }
    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not find home directory")?;
        return Ok(home.join(rest));
    }
    Ok(path.to_path_buf())
}

/// Makes a path absolute, resolving relative paths from current directory
///
/// `.` and `..` components are folded lexically; symlinks are not resolved.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined
pub fn make_absolute(path: &Path) -> Result<PathBuf> {
    let path = expand_tilde(path)?;
    let joined = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("Could not determine current directory")?
            .join(path)
    };
    Ok(lexical_normalize(&joined))
}

/// Folds `.` and `..` without touching the filesystem
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Path to `target` as seen from directory `base`
///
/// Both paths should be absolute. Falls back to `target` unchanged when they
/// share no root (different Windows drives).
#[must_use]
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = target.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();

    if target.first() != base.first() {
        return target.iter().collect();
    }

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component);
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}
