//! Persistent per-directory monitoring state.
//!
//! The `StateStore` owns every [`MonitoredDirectory`] and writes the whole
//! collection to a single JSON file after each mutation. Writes go through a
//! temporary file and a rename, so a crash leaves either the old or the new
//! state on disk, never a torn file.
//!
//! # Layout
//!
//! ```json
//! {
//!   "version": 1,
//!   "directories": {
//!     "6f1c…": { "path": "/downloads/tv", "known_files": ["…"], … }
//!   }
//! }
//! ```

use crate::error::ShelfError;
use crate::utils::{get_current_timestamp, serialization};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Cumulative processing counters for one directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStats {
    /// Files linked successfully
    pub total_processed: u64,
    /// Files that failed
    pub total_errors: u64,
    /// Files skipped (no catalog match, ambiguous, already linked elsewhere)
    pub total_skipped: u64,
    /// Unix seconds of the last recorded batch, 0 if none
    pub last_processed: i64,
}

/// One watched root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredDirectory {
    /// Stable identifier, assigned once
    pub id: String,
    /// Absolute path of the watched root
    pub path: PathBuf,
    /// Human-readable label
    pub description: String,
    /// Unix seconds at creation
    pub created_at: i64,
    /// Paused directories are skipped by the monitor loop
    pub active: bool,
    /// Process new files immediately instead of queueing them
    pub auto_process: bool,
    /// Every eligible file ever observed
    #[serde(default)]
    pub known_files: BTreeSet<PathBuf>,
    /// Files waiting for manual processing, oldest first
    #[serde(default)]
    pub pending_files: Vec<PathBuf>,
    /// Folder path to catalog id, for folders tagged like `Title [12345]`
    #[serde(default)]
    pub tmdb_folders: BTreeMap<String, String>,
    #[serde(default)]
    pub stats: DirectoryStats,
}

impl MonitoredDirectory {
    /// Creates an active entry with a fresh id
    ///
    /// The description defaults to the directory's base name.
    #[must_use]
    pub fn new(path: PathBuf, description: Option<String>, auto_process: bool) -> Self {
        let description = description.filter(|d| !d.trim().is_empty()).unwrap_or_else(|| {
            path.file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
        });

        Self {
            id: Uuid::new_v4().to_string(),
            path,
            description,
            created_at: get_current_timestamp(),
            active: true,
            auto_process,
            known_files: BTreeSet::new(),
            pending_files: Vec::new(),
            tmdb_folders: BTreeMap::new(),
            stats: DirectoryStats::default(),
        }
    }

    /// Whether the watched root currently exists
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.path.is_dir()
    }

    /// Catalog id of the nearest tagged ancestor folder of `file`
    #[must_use]
    pub fn tagged_id_for(&self, file: &Path) -> Option<&str> {
        file.ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(&self.path))
            .find_map(|dir| self.tmdb_folders.get(dir.to_string_lossy().as_ref()))
            .map(String::as_str)
    }

    /// Appends files to the pending queue, skipping ones already queued
    ///
    /// Returns how many were added.
    pub fn enqueue(&mut self, files: &[PathBuf]) -> usize {
        let mut queued: HashSet<PathBuf> = self.pending_files.iter().cloned().collect();
        let before = self.pending_files.len();
        for file in files {
            if queued.insert(file.clone()) {
                self.pending_files.push(file.clone());
            }
        }
        self.pending_files.len() - before
    }
}

/// Serialized form of the whole collection
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    directories: BTreeMap<String, MonitoredDirectory>,
}

/// Owner of all monitored directories and their persisted state
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    directories: BTreeMap<String, MonitoredDirectory>,
}

impl StateStore {
    /// Current state file format version
    const CURRENT_VERSION: u32 = 1;

    /// Creates an empty store that will persist to `path`
    #[must_use]
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            directories: BTreeMap::new(),
        }
    }

    /// Loads the store, starting empty when the file is missing or corrupt
    ///
    /// A corrupt file is moved aside to `<name>.corrupt` so the next save does
    /// not destroy it.
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        match Self::try_load(&path) {
            Ok(store) => store,
            Err(e) => {
                error!(path = %path.display(), "state file unreadable, starting empty: {e:#}");
                let backup = corrupt_backup_path(&path);
                match std::fs::rename(&path, &backup) {
                    Ok(()) => error!(backup = %backup.display(), "corrupt state preserved"),
                    Err(rename_err) => {
                        error!(backup = %backup.display(), "could not preserve corrupt state: {rename_err}");
                    }
                }
                Self::empty(path)
            }
        }
    }

    /// Loads the store, failing on unreadable or malformed content
    ///
    /// Returns an empty store when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::PersistenceCorrupt`] if the file cannot be read
    /// or decoded, or was written by a newer version.
    pub fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::empty(path.to_path_buf()));
        }

        let corrupt = |reason: String| ShelfError::PersistenceCorrupt {
            path: path.to_path_buf(),
            reason,
        };

        let data = std::fs::read(path).map_err(|e| corrupt(e.to_string()))?;
        let file: StateFile =
            serialization::deserialize(&data).map_err(|e| corrupt(format!("{e:#}")))?;

        if file.version > Self::CURRENT_VERSION {
            return Err(corrupt(format!(
                "version {} is newer than supported version {}",
                file.version,
                Self::CURRENT_VERSION
            ))
            .into());
        }

        // Keys are authoritative; repair entries whose embedded id drifted
        let mut directories = file.directories;
        for (id, dir) in &mut directories {
            dir.id.clone_from(id);
        }

        debug!(path = %path.display(), directories = directories.len(), "state loaded");
        Ok(Self {
            path: path.to_path_buf(),
            directories,
        })
    }

    /// Writes the full collection
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic replace fails
    pub fn save(&self) -> Result<()> {
        let file = StateFile {
            version: Self::CURRENT_VERSION,
            directories: self.directories.clone(),
        };
        let data = serialization::serialize(&file).context("Failed to serialize state")?;
        serialization::write_atomic(&self.path, &data)
            .with_context(|| format!("Failed to write state to {}", self.path.display()))
    }

    /// State file location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All directories, ordered by id
    pub fn directories(&self) -> impl Iterator<Item = &MonitoredDirectory> {
        self.directories.values()
    }

    /// Ids of all directories
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.directories.keys().cloned().collect()
    }

    /// Number of monitored directories
    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.len()
    }

    /// Whether nothing is monitored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// Looks up a directory by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MonitoredDirectory> {
        self.directories.get(id)
    }

    /// Looks up a directory by id, failing when it is unknown
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] if no entry has this id
    pub fn require(&self, id: &str) -> Result<&MonitoredDirectory> {
        self.directories
            .get(id)
            .ok_or_else(|| ShelfError::UnknownDirectory(id.to_string()).into())
    }

    /// Resolves a full id or an unambiguous id prefix
    #[must_use]
    pub fn resolve_id(&self, id_or_prefix: &str) -> Option<String> {
        if self.directories.contains_key(id_or_prefix) {
            return Some(id_or_prefix.to_string());
        }
        let mut matches = self
            .directories
            .keys()
            .filter(|id| !id_or_prefix.is_empty() && id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(id), None) => Some(id.clone()),
            _ => None,
        }
    }

    /// Finds the entry watching `path`
    #[must_use]
    pub fn find_by_path(&self, path: &Path) -> Option<&MonitoredDirectory> {
        self.directories.values().find(|d| d.path == path)
    }

    /// Total pending files across all directories
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.directories.values().map(|d| d.pending_files.len()).sum()
    }

    /// Adds a new directory and persists
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::AlreadyMonitored`] if the path is already watched,
    /// or an error if saving fails
    pub fn add(&mut self, directory: MonitoredDirectory) -> Result<String> {
        if self.find_by_path(&directory.path).is_some() {
            return Err(ShelfError::AlreadyMonitored(directory.path).into());
        }
        let id = directory.id.clone();
        info!(id = %id, path = %directory.path.display(), "directory added");
        self.directories.insert(id.clone(), directory);
        self.save()?;
        Ok(id)
    }

    /// Removes a directory and persists
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn remove(&mut self, id: &str) -> Result<MonitoredDirectory> {
        let removed = self
            .directories
            .remove(id)
            .ok_or_else(|| ShelfError::UnknownDirectory(id.to_string()))?;
        info!(id = %id, path = %removed.path.display(), "directory removed");
        self.save()?;
        Ok(removed)
    }

    /// Computes `current − known`, unions `current` into `known` and persists
    ///
    /// Returns the new files in path order. Known files are never dropped,
    /// even when they disappear from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn delta(&mut self, id: &str, current: &BTreeSet<PathBuf>) -> Result<Vec<PathBuf>> {
        let dir = self.entry_mut(id)?;
        let new_files: Vec<PathBuf> = current.difference(&dir.known_files).cloned().collect();
        if new_files.is_empty() {
            return Ok(new_files);
        }

        dir.known_files.extend(new_files.iter().cloned());
        debug!(id = %id, new = new_files.len(), known = dir.known_files.len(), "delta computed");
        self.save()?;
        Ok(new_files)
    }

    /// Adds to the cumulative counters and stamps `last_processed`
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn record_outcome(&mut self, id: &str, processed: u64, errors: u64, skipped: u64) -> Result<()> {
        let dir = self.entry_mut(id)?;
        dir.stats.total_processed += processed;
        dir.stats.total_errors += errors;
        dir.stats.total_skipped += skipped;
        dir.stats.last_processed = get_current_timestamp();
        self.save()
    }

    /// Pauses or resumes a directory
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn set_active(&mut self, id: &str, active: bool) -> Result<()> {
        self.entry_mut(id)?.active = active;
        info!(id = %id, active, "directory status changed");
        self.save()
    }

    /// Toggles auto-processing for a directory
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn set_auto_process(&mut self, id: &str, auto_process: bool) -> Result<()> {
        self.entry_mut(id)?.auto_process = auto_process;
        self.save()
    }

    /// Drops every pending file of a directory, returning how many were dropped
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn clear_pending(&mut self, id: &str) -> Result<usize> {
        let dir = self.entry_mut(id)?;
        let cleared = dir.pending_files.len();
        dir.pending_files.clear();
        self.save()?;
        Ok(cleared)
    }

    /// Queues files for manual processing
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn enqueue_pending(&mut self, id: &str, files: &[PathBuf]) -> Result<usize> {
        let added = self.entry_mut(id)?.enqueue(files);
        if added > 0 {
            self.save()?;
        }
        Ok(added)
    }

    /// Removes the given files from the pending queue
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn remove_pending(&mut self, id: &str, consumed: &[PathBuf]) -> Result<usize> {
        let consumed: HashSet<&PathBuf> = consumed.iter().collect();
        let dir = self.entry_mut(id)?;
        let before = dir.pending_files.len();
        dir.pending_files.retain(|p| !consumed.contains(p));
        let removed = before - dir.pending_files.len();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    /// Merges newly detected tagged folders
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::UnknownDirectory`] or a save error
    pub fn record_tagged_folders(&mut self, id: &str, folders: BTreeMap<String, String>) -> Result<()> {
        let dir = self.entry_mut(id)?;
        let before = dir.tmdb_folders.clone();
        dir.tmdb_folders.extend(folders);
        if dir.tmdb_folders != before {
            self.save()?;
        }
        Ok(())
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut MonitoredDirectory> {
        self.directories
            .get_mut(id)
            .ok_or_else(|| ShelfError::UnknownDirectory(id.to_string()).into())
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_dir(temp: &TempDir) -> (StateStore, String) {
        let mut store = StateStore::load(temp.path().join("state.json"));
        let id = store
            .add(MonitoredDirectory::new(temp.path().join("downloads"), None, false))
            .unwrap();
        (store, id)
    }

    fn files(names: &[&str]) -> BTreeSet<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("/dl/{n}"))).collect()
    }

    #[test]
    fn test_new_directory_defaults() {
        let dir = MonitoredDirectory::new(PathBuf::from("/srv/downloads/tv"), None, true);
        assert_eq!(dir.description, "tv");
        assert!(dir.active);
        assert!(dir.auto_process);
        assert!(Uuid::parse_str(&dir.id).is_ok());
        assert_eq!(dir.stats, DirectoryStats::default());
    }

    #[test]
    fn test_delta_is_set_difference_and_persists() {
        let temp = TempDir::new().unwrap();
        let (mut store, id) = store_with_dir(&temp);

        let first = store.delta(&id, &files(&["a.mkv", "b.mkv"])).unwrap();
        assert_eq!(first.len(), 2);

        let second = store.delta(&id, &files(&["a.mkv", "b.mkv", "c.mkv"])).unwrap();
        assert_eq!(second, vec![PathBuf::from("/dl/c.mkv")]);

        let reloaded = StateStore::try_load(store.path()).unwrap();
        assert_eq!(reloaded.get(&id).unwrap().known_files.len(), 3);
    }

    #[test]
    fn test_known_files_never_shrink() {
        let temp = TempDir::new().unwrap();
        let (mut store, id) = store_with_dir(&temp);

        store.delta(&id, &files(&["a.mkv", "b.mkv"])).unwrap();
        let new = store.delta(&id, &files(&["a.mkv"])).unwrap();
        assert!(new.is_empty());
        assert_eq!(store.get(&id).unwrap().known_files.len(), 2);
    }

    #[test]
    fn test_record_outcome_accumulates() {
        let temp = TempDir::new().unwrap();
        let (mut store, id) = store_with_dir(&temp);

        store.record_outcome(&id, 3, 1, 2).unwrap();
        store.record_outcome(&id, 1, 0, 0).unwrap();

        let stats = store.get(&id).unwrap().stats;
        assert_eq!(stats.total_processed, 4);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.total_skipped, 2);
        assert!(stats.last_processed > 0);
    }

    #[test]
    fn test_pending_queue_dedup_and_clear() {
        let temp = TempDir::new().unwrap();
        let (mut store, id) = store_with_dir(&temp);
        let a = PathBuf::from("/dl/a.mkv");
        let b = PathBuf::from("/dl/b.mkv");

        assert_eq!(store.enqueue_pending(&id, &[a.clone(), b.clone()]).unwrap(), 2);
        assert_eq!(store.enqueue_pending(&id, &[a.clone()]).unwrap(), 0);
        assert_eq!(store.pending_count(), 2);

        assert_eq!(store.remove_pending(&id, &[a]).unwrap(), 1);
        assert_eq!(store.get(&id).unwrap().pending_files, vec![b]);

        assert_eq!(store.clear_pending(&id).unwrap(), 1);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_unknown_id() {
        let temp = TempDir::new().unwrap();
        let mut store = StateStore::load(temp.path().join("state.json"));
        let err = store.set_active("nope", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShelfError>(),
            Some(ShelfError::UnknownDirectory(_))
        ));
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let temp = TempDir::new().unwrap();
        let (mut store, _) = store_with_dir(&temp);
        let err = store
            .add(MonitoredDirectory::new(temp.path().join("downloads"), None, false))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ShelfError>(),
            Some(ShelfError::AlreadyMonitored(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_corrupt_file_starts_empty_and_is_preserved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, b"{ definitely not json").unwrap();

        assert!(matches!(
            StateStore::try_load(&path).unwrap_err().downcast_ref::<ShelfError>(),
            Some(ShelfError::PersistenceCorrupt { .. })
        ));

        let store = StateStore::load(path.clone());
        assert!(store.is_empty());
        assert!(temp.path().join("state.json.corrupt").exists());
    }

    #[test]
    fn test_resolve_id_prefix() {
        let temp = TempDir::new().unwrap();
        let (store, id) = store_with_dir(&temp);
        assert_eq!(store.resolve_id(&id[..8]), Some(id.clone()));
        assert_eq!(store.resolve_id(&id), Some(id));
        assert_eq!(store.resolve_id(""), None);
    }

    #[test]
    fn test_tagged_id_lookup() {
        let mut dir = MonitoredDirectory::new(PathBuf::from("/dl"), None, false);
        dir.tmdb_folders
            .insert("/dl/Film (2020) [603]".to_string(), "603".to_string());

        assert_eq!(
            dir.tagged_id_for(Path::new("/dl/Film (2020) [603]/cd1/film.mkv")),
            Some("603")
        );
        assert_eq!(dir.tagged_id_for(Path::new("/dl/Other/film.mkv")), None);
    }
}
