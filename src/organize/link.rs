//! Filesystem side of organizing: creating, replacing and checking links.

use super::errors::LinkError;
use super::plan::DestinationPlan;
use crate::config::{Config, LinkKind};
use crate::utils::paths::{lexical_normalize, make_absolute, relative_path};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What [`LinkOrganizer::create_link`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new link was created.
    Created(PathBuf),
    /// A stale link at the destination was replaced.
    Replaced(PathBuf),
    /// The destination already pointed at the source.
    Unchanged(PathBuf),
}

impl LinkOutcome {
    /// Destination path of the link.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Replaced(p) | Self::Unchanged(p) => p,
        }
    }
}

/// Creates links below a destination root.
#[derive(Debug, Clone)]
pub struct LinkOrganizer {
    root: PathBuf,
    kind: LinkKind,
    relative: bool,
}

impl LinkOrganizer {
    /// Creates an organizer rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf, kind: LinkKind, relative: bool) -> Self {
        let root = make_absolute(&root).unwrap_or(root);
        Self {
            root,
            kind,
            relative,
        }
    }

    /// Creates an organizer from the `core` and `links` sections.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.core.destination_root.clone(),
            config.links.kind,
            config.links.relative,
        )
    }

    /// Destination root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Links `source` to the path described by `plan`.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] when the destination is occupied by a regular
    /// file, the source is missing, or the filesystem refuses the link.
    pub fn create_link(
        &self,
        source: &Path,
        plan: &DestinationPlan,
    ) -> Result<LinkOutcome, LinkError> {
        let destination = plan.destination(&self.root);
        let result = self.link_at(source, &destination);
        if let Err(e) = &result {
            warn!(
                source = %source.display(),
                destination = %destination.display(),
                category = e.category(),
                "link failed: {e}"
            );
        }
        result
    }

    /// Links `source` at an explicit `destination`.
    ///
    /// # Errors
    ///
    /// Same as [`LinkOrganizer::create_link`].
    pub fn link_at(&self, source: &Path, destination: &Path) -> Result<LinkOutcome, LinkError> {
        let source = match make_absolute(source) {
            Ok(p) => p,
            Err(_) => lexical_normalize(source),
        };

        match fs::metadata(&source) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(LinkError::SourceMissing { original: source });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LinkError::SourceMissing { original: source });
            }
            Err(e) => return Err(LinkError::from_io(e, &source, destination)),
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| LinkError::from_io(e, &source, destination))?;
        }

        let target = self.link_target(&source, destination);

        let replaced = match fs::symlink_metadata(destination) {
            Ok(meta) if meta.file_type().is_symlink() => {
                if self.kind == LinkKind::Symlink
                    && fs::read_link(destination).is_ok_and(|existing| existing == target)
                {
                    debug!(destination = %destination.display(), "link already in place");
                    return Ok(LinkOutcome::Unchanged(destination.to_path_buf()));
                }
                fs::remove_file(destination)
                    .map_err(|e| LinkError::from_io(e, &source, destination))?;
                true
            }
            Ok(meta) if meta.is_file() && self.kind == LinkKind::Hardlink => {
                if same_file(&source, destination) {
                    return Ok(LinkOutcome::Unchanged(destination.to_path_buf()));
                }
                return Err(LinkError::Conflict {
                    destination: destination.to_path_buf(),
                });
            }
            Ok(_) => {
                return Err(LinkError::Conflict {
                    destination: destination.to_path_buf(),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(LinkError::from_io(e, &source, destination)),
        };

        match self.kind {
            LinkKind::Symlink => make_symlink(&target, destination),
            LinkKind::Hardlink => fs::hard_link(&source, destination),
        }
        .map_err(|e| LinkError::from_io(e, &source, destination))?;

        debug!(
            source = %source.display(),
            destination = %destination.display(),
            replaced,
            "linked"
        );

        let path = destination.to_path_buf();
        Ok(if replaced {
            LinkOutcome::Replaced(path)
        } else {
            LinkOutcome::Created(path)
        })
    }

    /// What a symlink at `destination` should contain.
    #[must_use]
    pub fn link_target(&self, source: &Path, destination: &Path) -> PathBuf {
        match (self.relative, destination.parent()) {
            (true, Some(dir)) => relative_path(source, dir),
            _ => source.to_path_buf(),
        }
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(_a: &Path, _b: &Path) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plan() -> DestinationPlan {
        DestinationPlan {
            category_folder: "Movies".to_string(),
            quality_folder: None,
            title_folder: "Film (2020)".to_string(),
            season_folder: None,
            file_name: "film.mkv".to_string(),
        }
    }

    fn setup() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("downloads/film.mkv");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"video").unwrap();
        (temp, source)
    }

    #[test]
    fn test_create_link_is_idempotent() {
        let (temp, source) = setup();
        let organizer = LinkOrganizer::new(temp.path().join("lib"), LinkKind::Symlink, false);

        let first = organizer.create_link(&source, &plan()).unwrap();
        assert!(matches!(first, LinkOutcome::Created(_)));
        let second = organizer.create_link(&source, &plan()).unwrap();
        assert!(matches!(second, LinkOutcome::Unchanged(_)));

        let dest = temp.path().join("lib/Movies/Film (2020)/film.mkv");
        assert_eq!(fs::read_link(&dest).unwrap(), source);
        assert_eq!(fs::read(&dest).unwrap(), b"video");
    }

    #[test]
    fn test_stale_link_replaced() {
        let (temp, source) = setup();
        let organizer = LinkOrganizer::new(temp.path().join("lib"), LinkKind::Symlink, false);
        let dest = temp.path().join("lib/Movies/Film (2020)/film.mkv");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.mkv"), &dest).unwrap();

        let outcome = organizer.create_link(&source, &plan()).unwrap();
        assert!(matches!(outcome, LinkOutcome::Replaced(_)));
        assert_eq!(fs::read_link(&dest).unwrap(), source);
    }

    #[test]
    fn test_regular_file_is_conflict() {
        let (temp, source) = setup();
        let organizer = LinkOrganizer::new(temp.path().join("lib"), LinkKind::Symlink, false);
        let dest = temp.path().join("lib/Movies/Film (2020)/film.mkv");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, b"precious").unwrap();

        let err = organizer.create_link(&source, &plan()).unwrap_err();
        assert!(matches!(err, LinkError::Conflict { .. }));
        assert_eq!(fs::read(&dest).unwrap(), b"precious");
        assert!(!fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
    }

    #[test]
    fn test_relative_symlink() {
        let (temp, source) = setup();
        let organizer = LinkOrganizer::new(temp.path().join("lib"), LinkKind::Symlink, true);

        organizer.create_link(&source, &plan()).unwrap();
        let dest = temp.path().join("lib/Movies/Film (2020)/film.mkv");
        let target = fs::read_link(&dest).unwrap();
        assert!(target.is_relative());
        assert_eq!(target, Path::new("../../../downloads/film.mkv"));
        assert_eq!(fs::read(&dest).unwrap(), b"video");
    }

    #[test]
    fn test_hardlink_twice_is_unchanged() {
        let (temp, source) = setup();
        let organizer = LinkOrganizer::new(temp.path().join("lib"), LinkKind::Hardlink, false);

        assert!(matches!(
            organizer.create_link(&source, &plan()).unwrap(),
            LinkOutcome::Created(_)
        ));
        assert!(matches!(
            organizer.create_link(&source, &plan()).unwrap(),
            LinkOutcome::Unchanged(_)
        ));
    }

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let organizer = LinkOrganizer::new(temp.path().join("lib"), LinkKind::Symlink, false);
        let err = organizer
            .create_link(&temp.path().join("nope.mkv"), &plan())
            .unwrap_err();
        assert!(matches!(err, LinkError::SourceMissing { .. }));
    }
}
