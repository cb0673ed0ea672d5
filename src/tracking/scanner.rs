//! Directory scanner for discovering media files below a monitored root.
//!
//! The `DirectoryScanner` walks a directory tree and returns every file whose
//! extension is on the allow-list. Unreadable subtrees are logged and skipped,
//! so a scan only fails when the root itself is missing.

use crate::config::ScanConfig;
use crate::error::ShelfError;
use crate::utils::paths::make_absolute;
use crate::utils::should_ignore;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Scanner for enumerating media files in a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    /// Lowercase extensions without the leading dot
    extensions: Vec<String>,
    /// Glob patterns to ignore during scanning
    ignore_patterns: Vec<String>,
    /// Whether to descend into symlinked directories
    follow_symlinks: bool,
}

impl DirectoryScanner {
    /// Create a new directory scanner
    ///
    /// # Arguments
    ///
    /// * `extensions` - Allowed extensions, with or without the leading dot
    /// * `ignore_patterns` - Glob patterns to exclude (e.g., "*sample*")
    /// * `follow_symlinks` - Whether to follow symbolic links to directories
    #[must_use]
    pub fn new(extensions: &[String], ignore_patterns: Vec<String>, follow_symlinks: bool) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            extensions,
            ignore_patterns,
            follow_symlinks,
        }
    }

    /// Create a scanner from the `[scan]` configuration section
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(
            &config.extensions,
            config.ignore_patterns.clone(),
            config.follow_symlinks,
        )
    }

    /// Scan `root` and return absolute paths of all eligible media files
    ///
    /// Symlinked directories are only followed when enabled; walkdir's loop
    /// detection reports cycles as errors, which are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::NotFound`] if `root` does not exist or is not a directory.
    pub fn scan(&self, root: &Path) -> Result<BTreeSet<PathBuf>> {
        let root = make_absolute(root)?;
        if !root.is_dir() {
            return Err(ShelfError::NotFound(root).into());
        }

        let mut files = BTreeSet::new();
        let mut skipped = 0usize;

        let walker = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(|e| !self.should_skip_entry(&root, e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skipped += 1;
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    if err.loop_ancestor().is_some() {
                        warn!(path = %path.display(), "symlink loop detected, not descending");
                    } else {
                        warn!(path = %path.display(), "skipping unreadable entry: {err}");
                    }
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_media_file(entry.path()) {
                files.insert(entry.into_path());
            }
        }

        debug!(
            root = %root.display(),
            found = files.len(),
            skipped,
            "scan complete"
        );
        Ok(files)
    }

    /// Whether `path` carries an allowed extension
    #[must_use]
    pub fn is_media_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }

    /// Check if a directory entry should be skipped
    fn should_skip_entry(&self, root: &Path, entry: &walkdir::DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let relative_path = entry.path().strip_prefix(root).unwrap_or(entry.path());
        should_ignore(relative_path, &self.ignore_patterns)
    }
}

static FOLDER_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[(?:tmdb(?:id)?[-=])?(\d+)\]").expect("folder id pattern must compile")
});

/// Finds folders between `root` and each file whose name carries a catalog id
///
/// Recognizes `Title (2020) [603]`, `Title [tmdb-603]` and `Title {tmdbid=603}`
/// style tags. Keys are the folder paths, values the numeric id.
#[must_use]
pub fn tagged_folders(root: &Path, files: &BTreeSet<PathBuf>) -> BTreeMap<String, String> {
    let mut folders = BTreeMap::new();
    for file in files {
        for dir in file.ancestors().skip(1).take_while(|d| d.starts_with(root)) {
            let key = dir.to_string_lossy().into_owned();
            if folders.contains_key(&key) {
                continue;
            }
            let name = dir.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            let normalized = name.replace('{', "[").replace('}', "]");
            if let Some(id) = FOLDER_ID.captures(&normalized).and_then(|c| c.get(1)) {
                debug!(folder = %dir.display(), id = id.as_str(), "tagged folder detected");
                folders.insert(key, id.as_str().to_string());
            }
        }
    }
    folders
}
