//! Repair of library symlinks whose source moved or vanished.
//!
//! The library tree is walked once to collect every symlink; checking the
//! targets runs in parallel since it is one `stat` per link. Each broken link
//! is then relinked to a file with the same name found under the search roots.

use crate::config::LinkKind;
use crate::organize::{LinkOrganizer, LinkOutcome};
use crate::tracking::DirectoryScanner;
use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A symlink whose target does not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    /// Location of the link inside the library
    pub link: PathBuf,
    /// What the link points at
    pub target: PathBuf,
}

/// How a broken link was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    /// Relinked to a new source
    Relinked {
        /// The link that was fixed
        link: PathBuf,
        /// Its new source
        source: PathBuf,
    },
    /// No candidate source was found
    NoCandidate(PathBuf),
    /// Several files share the name; left alone rather than guessing
    Ambiguous(PathBuf, usize),
    /// Relinking failed
    Failed(PathBuf, String),
}

/// Totals of a repair run
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    /// Broken links found
    pub found: usize,
    /// Links relinked
    pub repaired: usize,
    /// Links that could not be fixed
    pub failed: usize,
    /// Per-link detail
    pub actions: Vec<RepairAction>,
}

/// Every symlink under `root` whose target is missing
///
/// # Errors
///
/// Returns an error if `root` itself cannot be read
pub fn find_broken_links(root: &Path) -> Result<Vec<BrokenLink>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let links: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable library entry: {e}");
                None
            }
        })
        .filter(|entry| entry.path_is_symlink())
        .map(walkdir::DirEntry::into_path)
        .collect();

    let mut broken: Vec<BrokenLink> = links
        .par_iter()
        .filter(|link| std::fs::metadata(link).is_err())
        .filter_map(|link| {
            std::fs::read_link(link).ok().map(|target| BrokenLink {
                link: link.clone(),
                target,
            })
        })
        .collect();
    broken.sort_by(|a, b| a.link.cmp(&b.link));

    debug!(root = %root.display(), links = links.len(), broken = broken.len(), "library checked");
    Ok(broken)
}

/// Relinks broken symlinks in a library
pub struct LinkRepairer {
    organizer: LinkOrganizer,
    scanner: DirectoryScanner,
}

impl LinkRepairer {
    /// Repairer writing symlinks below `root`, absolute or relative
    #[must_use]
    pub fn new(root: PathBuf, relative: bool, scanner: DirectoryScanner) -> Self {
        Self {
            organizer: LinkOrganizer::new(root, LinkKind::Symlink, relative),
            scanner,
        }
    }

    /// Finds and repairs broken links, looking for sources under `search_roots`
    ///
    /// Missing search roots are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be walked
    pub fn repair(&self, search_roots: &[PathBuf]) -> Result<RepairReport> {
        let broken = find_broken_links(self.organizer.root())?;
        let mut report = RepairReport {
            found: broken.len(),
            ..RepairReport::default()
        };
        if broken.is_empty() {
            return Ok(report);
        }

        let index = self.index_by_name(search_roots);
        for item in broken {
            let action = self.repair_one(&item, &index);
            match &action {
                RepairAction::Relinked { .. } => report.repaired += 1,
                _ => report.failed += 1,
            }
            report.actions.push(action);
        }

        info!(found = report.found, repaired = report.repaired, failed = report.failed, "repair complete");
        Ok(report)
    }

    fn index_by_name(&self, search_roots: &[PathBuf]) -> HashMap<OsString, Vec<PathBuf>> {
        let mut index: HashMap<OsString, Vec<PathBuf>> = HashMap::new();
        for root in search_roots {
            match self.scanner.scan(root) {
                Ok(files) => {
                    for file in files {
                        if let Some(name) = file.file_name() {
                            index.entry(name.to_os_string()).or_default().push(file);
                        }
                    }
                }
                Err(e) => warn!(root = %root.display(), "search root skipped: {e:#}"),
            }
        }
        index
    }

    fn repair_one(&self, item: &BrokenLink, index: &HashMap<OsString, Vec<PathBuf>>) -> RepairAction {
        let Some(name) = item.target.file_name().or_else(|| item.link.file_name()) else {
            return RepairAction::NoCandidate(item.link.clone());
        };

        let candidates = index.get(name).map_or(&[][..], Vec::as_slice);
        let source = match candidates {
            [] => {
                warn!(link = %item.link.display(), "no replacement source found");
                return RepairAction::NoCandidate(item.link.clone());
            }
            [only] => only,
            many => {
                warn!(link = %item.link.display(), candidates = many.len(), "several replacement sources, skipping");
                return RepairAction::Ambiguous(item.link.clone(), many.len());
            }
        };

        match self.organizer.link_at(source, &item.link) {
            Ok(LinkOutcome::Created(_) | LinkOutcome::Replaced(_) | LinkOutcome::Unchanged(_)) => {
                info!(link = %item.link.display(), source = %source.display(), "link repaired");
                RepairAction::Relinked {
                    link: item.link.clone(),
                    source: source.clone(),
                }
            }
            Err(e) => RepairAction::Failed(item.link.clone(), e.to_string()),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn scanner() -> DirectoryScanner {
        DirectoryScanner::from_config(&ScanConfig::default())
    }

    #[test]
    fn test_find_broken_links() {
        let temp = TempDir::new().unwrap();
        let library = temp.path().join("library/Movies/Heat (1995)");
        fs::create_dir_all(&library).unwrap();
        let real = temp.path().join("real.mkv");
        fs::write(&real, b"v").unwrap();

        symlink(&real, library.join("ok.mkv")).unwrap();
        symlink(temp.path().join("gone.mkv"), library.join("gone.mkv")).unwrap();

        let broken = find_broken_links(&temp.path().join("library")).unwrap();
        assert_eq!(broken.len(), 1);
        assert!(broken[0].link.ends_with("gone.mkv"));
    }

    #[test]
    fn test_repair_relinks_moved_file() {
        let temp = TempDir::new().unwrap();
        let library = temp.path().join("library");
        let link = library.join("Movies/Heat (1995)/Heat.1995.mkv");
        fs::create_dir_all(link.parent().unwrap()).unwrap();
        symlink(temp.path().join("old/Heat.1995.mkv"), &link).unwrap();

        let moved = temp.path().join("new/sub/Heat.1995.mkv");
        fs::create_dir_all(moved.parent().unwrap()).unwrap();
        fs::write(&moved, b"v").unwrap();

        let repairer = LinkRepairer::new(library, false, scanner());
        let report = repairer.repair(&[temp.path().join("new")]).unwrap();

        assert_eq!((report.found, report.repaired, report.failed), (1, 1, 0));
        assert_eq!(fs::read_link(&link).unwrap(), moved);
        assert_eq!(fs::read(&link).unwrap(), b"v");
    }

    #[test]
    fn test_repair_without_candidate_counts_failure() {
        let temp = TempDir::new().unwrap();
        let library = temp.path().join("library");
        fs::create_dir_all(&library).unwrap();
        symlink(temp.path().join("lost.mkv"), library.join("lost.mkv")).unwrap();

        let repairer = LinkRepairer::new(library, false, scanner());
        let report = repairer.repair(&[temp.path().join("missing-root")]).unwrap();
        assert_eq!((report.found, report.repaired, report.failed), (1, 0, 1));
        assert!(matches!(report.actions[0], RepairAction::NoCandidate(_)));
    }

    #[test]
    fn test_missing_library_has_nothing_to_repair() {
        let temp = TempDir::new().unwrap();
        let repairer = LinkRepairer::new(temp.path().join("nope"), false, scanner());
        assert_eq!(repairer.repair(&[]).unwrap().found, 0);
    }
}
