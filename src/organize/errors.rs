use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a link could not be created
///
/// Every variant carries the paths involved so the message is actionable
/// without extra context.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Destination exists and is a regular file or directory, not a link
    #[error("refusing to overwrite {} (not a link)", destination.display())]
    Conflict { destination: PathBuf },

    /// Source file vanished before it could be linked
    #[error("source file is missing: {}", original.display())]
    SourceMissing { original: PathBuf },

    /// Insufficient permissions on the source or destination side
    #[error("permission denied linking {} -> {}", destination.display(), original.display())]
    PermissionDenied {
        original: PathBuf,
        destination: PathBuf,
    },

    /// Hardlink requested across filesystems
    #[error(
        "cannot hardlink across filesystems: {} and {} are on different devices (use symlinks instead)",
        original.display(),
        destination.display()
    )]
    CrossDevice {
        original: PathBuf,
        destination: PathBuf,
    },

    /// Destination path exceeds filesystem limits
    #[error("destination path too long: {}", destination.display())]
    PathTooLong { destination: PathBuf },

    /// Any other I/O failure
    #[error("failed to link {} -> {}: {error}", destination.display(), original.display())]
    Io {
        original: PathBuf,
        destination: PathBuf,
        #[source]
        error: io::Error,
    },
}

impl LinkError {
    /// Maps a raw I/O error to the most specific variant
    #[must_use]
    pub fn from_io(error: io::Error, original: &Path, destination: &Path) -> Self {
        if error.kind() == io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                original: original.to_path_buf(),
                destination: destination.to_path_buf(),
            };
        }

        #[cfg(unix)]
        match error.raw_os_error() {
            Some(libc::EXDEV) => {
                return Self::CrossDevice {
                    original: original.to_path_buf(),
                    destination: destination.to_path_buf(),
                };
            }
            Some(libc::ENAMETOOLONG) => {
                return Self::PathTooLong {
                    destination: destination.to_path_buf(),
                };
            }
            _ => {}
        }

        Self::Io {
            original: original.to_path_buf(),
            destination: destination.to_path_buf(),
            error,
        }
    }

    /// Short category label for logs and summaries
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "conflict",
            Self::SourceMissing { .. } => "source-missing",
            Self::PermissionDenied { .. } => "permission",
            Self::CrossDevice { .. } => "cross-device",
            Self::PathTooLong { .. } => "path-too-long",
            Self::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_mapping() {
        let err = LinkError::from_io(
            io::Error::from(io::ErrorKind::PermissionDenied),
            Path::new("/src/a.mkv"),
            Path::new("/dst/a.mkv"),
        );
        assert!(matches!(err, LinkError::PermissionDenied { .. }));
        assert_eq!(err.category(), "permission");
    }

    #[cfg(unix)]
    #[test]
    fn test_errno_mapping() {
        let cross = LinkError::from_io(
            io::Error::from_raw_os_error(libc::EXDEV),
            Path::new("/a"),
            Path::new("/b"),
        );
        assert!(matches!(cross, LinkError::CrossDevice { .. }));
        assert!(cross.to_string().contains("different devices"));

        let long = LinkError::from_io(
            io::Error::from_raw_os_error(libc::ENAMETOOLONG),
            Path::new("/a"),
            Path::new("/b"),
        );
        assert!(matches!(long, LinkError::PathTooLong { .. }));
    }

    #[test]
    fn test_other_errors_keep_source() {
        let err = LinkError::from_io(
            io::Error::other("disk on fire"),
            Path::new("/a"),
            Path::new("/b"),
        );
        assert!(matches!(err, LinkError::Io { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
