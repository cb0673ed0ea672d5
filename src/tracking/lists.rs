//! Hand-maintained title lists that override the keyword vote.
//!
//! A lists folder holds up to four plain text files, one entry per line in
//! the form `Title (Year) [tmdbid]`. Files are consulted in a fixed order so
//! that an anime series listed in both `anime_series.txt` and `tv_series.txt`
//! resolves as anime.

use crate::classify::ContentKind;
use crate::config::ScanConfig;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// List files in lookup order
pub const LIST_FILES: &[(&str, ContentKind, bool)] = &[
    ("anime_series.txt", ContentKind::Tv, true),
    ("anime_movies.txt", ContentKind::Movie, true),
    ("tv_series.txt", ContentKind::Tv, false),
    ("movies.txt", ContentKind::Movie, false),
];

static ENTRY_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[(?:tmdb(?:id)?[-=])?(\d+)\]\s*$").expect("list id pattern must compile")
});

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|\(\s*\d{4}\s*\)").expect("bracket pattern must compile"));

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._\-\s]+").expect("separator pattern must compile"));

/// What a list says about a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMatch {
    /// Movie or series
    pub kind: ContentKind,
    /// Came from one of the anime lists
    pub anime: bool,
    /// Catalog id from the entry's trailing brackets
    pub tmdb_id: Option<String>,
}

#[derive(Debug, Clone)]
struct ListEntry {
    key: String,
    kind: ContentKind,
    anime: bool,
    tmdb_id: Option<String>,
}

/// Loaded title lists, in lookup order
#[derive(Debug, Clone, Default)]
pub struct ScannerLists {
    entries: Vec<ListEntry>,
}

impl ScannerLists {
    /// Reads every list file present in `dir`
    ///
    /// Missing files count as empty lists. Blank lines and `#` comments are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a list file exists but cannot be read.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut lists = Self::default();
        for (file_name, kind, anime) in LIST_FILES {
            let path = dir.join(file_name);
            if !path.is_file() {
                continue;
            }
            let content =
                fs::read_to_string(&path).with_context(|| format!("Failed to read list: {}", path.display()))?;
            lists.push_lines(&content, *kind, *anime);
        }
        debug!(dir = %dir.display(), entries = lists.len(), "title lists loaded");
        Ok(lists)
    }

    /// Lists from `[scan] lists_dir`; unreadable lists are logged and ignored
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        let Some(dir) = &config.lists_dir else {
            return Self::default();
        };
        Self::load(dir).unwrap_or_else(|e| {
            warn!("title lists unavailable: {e:#}");
            Self::default()
        })
    }

    /// Adds the entries of one list's text
    #[must_use]
    pub fn with_list(mut self, content: &str, kind: ContentKind, anime: bool) -> Self {
        self.push_lines(content, kind, anime);
        self
    }

    fn push_lines(&mut self, content: &str, kind: ContentKind, anime: bool) {
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let key = normalize(line);
            if key.is_empty() {
                continue;
            }
            self.entries.push(ListEntry {
                key,
                kind,
                anime,
                tmdb_id: ENTRY_ID.captures(line).map(|caps| caps[1].to_string()),
            });
        }
    }

    /// Entry naming `folder`, exact matches before partial ones
    #[must_use]
    pub fn lookup(&self, folder: &str) -> Option<ListMatch> {
        let key = normalize(folder);
        if key.is_empty() {
            return None;
        }
        let padded = format!(" {key} ");

        let entry = self.entries.iter().find(|e| e.key == key).or_else(|| {
            self.entries.iter().find(|e| {
                let entry = format!(" {} ", e.key);
                padded.contains(&entry) || entry.contains(&padded)
            })
        })?;

        Some(ListMatch {
            kind: entry.kind,
            anime: entry.anime,
            tmdb_id: entry.tmdb_id.clone(),
        })
    }

    /// Number of entries across all lists
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no list has entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase words without ids, years or separators
fn normalize(name: &str) -> String {
    let stripped = BRACKETED.replace_all(name, " ");
    SEPARATORS
        .replace_all(&stripped, " ")
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_reads_present_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("movies.txt"),
            "# favourites\nHeat (1995) [949]\n\nThe Thing (1982) [1091]\n",
        )
        .unwrap();

        let lists = ScannerLists::load(dir.path()).unwrap();
        assert_eq!(lists.len(), 2);

        let hit = lists.lookup("Heat (1995)").unwrap();
        assert_eq!(hit.kind, ContentKind::Movie);
        assert!(!hit.anime);
        assert_eq!(hit.tmdb_id.as_deref(), Some("949"));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let lists = ScannerLists::load(&dir.path().join("absent")).unwrap();
        assert!(lists.is_empty());
        assert!(ScannerLists::from_config(&ScanConfig::default()).is_empty());
    }

    #[test]
    fn test_anime_list_wins_over_tv_list() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tv_series.txt"), "Frieren (2023) [1]\n").unwrap();
        fs::write(dir.path().join("anime_series.txt"), "Frieren (2023) [209867]\n").unwrap();

        let hit = ScannerLists::load(dir.path()).unwrap().lookup("Frieren").unwrap();
        assert_eq!(hit.kind, ContentKind::Tv);
        assert!(hit.anime);
        assert_eq!(hit.tmdb_id.as_deref(), Some("209867"));
    }

    #[test]
    fn test_separators_and_case_are_ignored() {
        let lists = ScannerLists::default().with_list("The Expanse (2015) [63639]", ContentKind::Tv, false);
        let hit = lists.lookup("the.expanse.S01.1080p").unwrap();
        assert_eq!(hit.kind, ContentKind::Tv);
        assert_eq!(hit.tmdb_id.as_deref(), Some("63639"));
        assert!(lists.lookup("The_Expanse").is_some());
    }

    #[test]
    fn test_partial_words_do_not_match() {
        let lists = ScannerLists::default().with_list("Up (2009) [14160]", ContentKind::Movie, false);
        assert!(lists.lookup("Upload").is_none());
        assert!(lists.lookup("Season 1").is_none());
        assert!(lists.lookup("").is_none());
    }

    #[test]
    fn test_entry_without_id() {
        let lists = ScannerLists::default().with_list("Cowboy Bebop", ContentKind::Tv, true);
        let hit = lists.lookup("Cowboy Bebop (1998)").unwrap();
        assert_eq!(hit.tmdb_id, None);
        assert!(hit.anime);
    }
}
