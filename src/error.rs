//! Typed failures surfaced by the library.
//!
//! Most functions return [`anyhow::Result`]; when the failure is one a caller
//! may want to branch on, the error inside is a [`ShelfError`] and can be
//! recovered with `downcast_ref`.

use crate::organize::LinkError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure categories the monitor and CLI react to.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// A directory or file that should exist is gone.
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Neither the name nor its path context settled movie vs. episode.
    #[error("cannot tell whether '{0}' is a movie or an episode")]
    ParseAmbiguous(String),

    /// Link creation failed; see [`LinkError`].
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The state file could not be decoded.
    #[error("state file {} is unreadable: {reason}", path.display())]
    PersistenceCorrupt {
        /// State file location.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// The catalog had no usable answer.
    #[error("catalog lookup failed for '{query}': {reason}")]
    ExternalLookupFailure {
        /// Title or id that was looked up.
        query: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// No monitored directory carries this id.
    #[error("no monitored directory with id '{0}'")]
    UnknownDirectory(String),

    /// The directory is already being monitored.
    #[error("directory is already monitored: {}", .0.display())]
    AlreadyMonitored(PathBuf),

    /// Another process holds the state lock.
    #[error("state is locked by another process: {0}")]
    Locked(String),
}
