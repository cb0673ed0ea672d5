#![warn(missing_docs)]
#![allow(clippy::arithmetic_side_effects)] // Counters over file batches cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Linkshelf - Download Directory Monitor and Library Organizer
//!
//! Linkshelf watches download directories, recognizes new media files and
//! links them into a clean library tree (`Movies/Title (Year)/…`,
//! `TV Shows/Title/Season 01/…`) without moving or copying the originals.
//!
//! ## Architecture
//!
//! - [`parser`]: clean title, year, season and episode from a release name
//! - [`classify`]: movie vs. episode vote and anime detection
//! - [`tracking`]: directory scanning and persisted per-directory state
//! - [`organize`]: destination layout and link creation
//! - [`pipeline`]: the per-file chain from name to link
//! - [`monitor`]: scan cycles and the background loop
//! - [`repair`]: relinking library symlinks whose source moved
//! - [`config`]: TOML configuration with validation
//! - [`commands`]: CLI command implementations
//!
//! ## Example Usage
//!
//! ```no_run
//! use linkshelf::ShelfContext;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = ShelfContext::new()?;
//! let manager = ctx.manager();
//!
//! let report = manager.add_directory(Path::new("/downloads/tv"), None, false)?;
//! println!("{} files queued", report.existing);
//!
//! let summary = manager.run_cycle();
//! println!("{} new files", summary.new_files);
//! # Ok(())
//! # }
//! ```

/// Metadata catalog seam and the offline catalog.
pub mod catalog;

/// Movie / episode classification.
pub mod classify;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// CLI command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Typed error categories.
pub mod error;

/// Cross-process locking of the state file.
pub mod lock;

/// Scan cycles and the background monitor loop.
pub mod monitor;

/// Notification events and sinks.
pub mod notify;

/// Library layout planning and link creation.
pub mod organize;

/// Terminal output styling.
pub mod output;

/// Release name parsing.
pub mod parser;

/// Per-file processing chain.
pub mod pipeline;

/// Broken symlink repair.
pub mod repair;

/// Directory scanning and monitoring state.
pub mod tracking;

/// Utility functions and helpers.
pub mod utils;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the shelf binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to the home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/linkshelf/config.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "LINKSHELF_CONFIG_PATH";

/// Environment variable overriding `core.state_path`.
pub const STATE_PATH_ENV: &str = "LINKSHELF_STATE_PATH";

/// Loaded configuration plus where it came from.
///
/// # Examples
///
/// ```no_run
/// use linkshelf::ShelfContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Default location, honoring LINKSHELF_CONFIG_PATH
/// let ctx = ShelfContext::new()?;
///
/// // Explicit location, for tests
/// let ctx = ShelfContext::new_explicit("/tmp/shelf/config.toml".into())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ShelfContext {
    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl ShelfContext {
    /// Loads the configuration from the environment override or the default path.
    ///
    /// Validation findings are logged as warnings, never fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or if the
    /// configuration file cannot be read, created or validated.
    pub fn new() -> Result<Self> {
        let config_path = if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        let ctx = Self::new_explicit(config_path)?;
        let validator = config::validator::ConfigValidator::new();
        if let Err(e) = validator.validate_config_file(&ctx.config_path) {
            tracing::warn!("configuration check failed: {e:#}");
        }
        Ok(ctx)
    }

    /// Loads the configuration from an explicit path, writing defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(config_path: PathBuf) -> Result<Self> {
        let mut config = config::Config::load(&config_path)?;
        if let Ok(path) = std::env::var(STATE_PATH_ENV) {
            config.core.state_path = PathBuf::from(path);
        }
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Monitor manager over the configured state, using the offline catalog.
    #[must_use]
    pub fn manager(&self) -> monitor::MonitorManager {
        monitor::MonitorManager::from_config(&self.config, Box::new(catalog::OfflineCatalog))
    }

    /// Exclusive lock on the configured state file.
    ///
    /// # Errors
    ///
    /// Returns [`error::ShelfError::Locked`] if another process holds it.
    pub fn lock_state(&self, purpose: lock::LockPurpose) -> Result<lock::StateLock> {
        lock::StateLock::acquire(&self.config.core.state_path, purpose)
    }
}
