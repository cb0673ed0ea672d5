//! Tracking of monitored download directories.
//!
//! Two pieces cooperate here:
//!
//! - [`crate::tracking::DirectoryScanner`] - enumerates eligible media files under a root
//! - [`crate::tracking::StateStore`] - remembers which files each root has already shown
//!
//! [`crate::tracking::ScannerLists`] sits beside them: optional title lists
//! that pin a folder to a library kind and catalog id.
//!
//! A monitor cycle scans a root, asks the store for the delta against the
//! known set and hands the new files on for processing.
//!
//! # Usage
//!
//! ```no_run
//! use linkshelf::config::ScanConfig;
//! use linkshelf::tracking::{DirectoryScanner, MonitoredDirectory, StateStore};
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut store = StateStore::load(PathBuf::from("/var/lib/linkshelf/monitored.json"));
//! let root = PathBuf::from("/downloads/tv");
//! let id = store.add(MonitoredDirectory::new(root.clone(), None, false))?;
//!
//! let scanner = DirectoryScanner::from_config(&ScanConfig::default());
//! let current = scanner.scan(&root)?;
//! let new_files = store.delta(&id, &current)?;
//! store.enqueue_pending(&id, &new_files)?;
//! # Ok(())
//! # }
//! ```

pub mod lists;
pub mod scanner;
pub mod state;

pub use lists::{ListMatch, ScannerLists};
pub use scanner::{DirectoryScanner, tagged_folders};
pub use state::{DirectoryStats, MonitoredDirectory, StateStore};
