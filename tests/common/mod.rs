#![allow(dead_code)]

use anyhow::Result;
use linkshelf::ShelfContext;
use linkshelf::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Downloads directory, library root, state file and config in one temp dir
pub struct TestShelf {
    pub temp_dir: TempDir,
    pub downloads: PathBuf,
    pub library: PathBuf,
    pub state_path: PathBuf,
    pub config_path: PathBuf,
}

impl TestShelf {
    /// Create the layout and write a config pointing into it
    pub fn new() -> Result<Self> {
        Self::with_config(|_| {})
    }

    /// Same as [`TestShelf::new`] with a hook to adjust the config first
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let downloads = temp_dir.path().join("downloads");
        let library = temp_dir.path().join("library");
        let state_path = temp_dir.path().join("state/monitored.json");
        let config_path = temp_dir.path().join(".config/linkshelf/config.toml");
        fs::create_dir_all(&downloads)?;

        let mut config = Config::default();
        config.core.state_path = state_path.clone();
        config.core.destination_root = library.clone();
        adjust(&mut config);
        config.save(&config_path)?;

        Ok(Self {
            temp_dir,
            downloads,
            library,
            state_path,
            config_path,
        })
    }

    /// Loaded context for library-level tests
    pub fn ctx(&self) -> Result<ShelfContext> {
        ShelfContext::new_explicit(self.config_path.clone())
    }

    /// Create a media file below the downloads directory
    pub fn add_download(&self, relative: &str) -> Result<PathBuf> {
        let path = self.downloads.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, b"media")?;
        Ok(path)
    }

    /// Path below the library root
    pub fn in_library(&self, relative: &str) -> PathBuf {
        self.library.join(relative)
    }

    /// `shelf` invocation bound to this layout
    pub fn shelf(&self) -> Result<assert_cmd::Command> {
        let mut cmd = assert_cmd::Command::cargo_bin("shelf")?;
        cmd.env("LINKSHELF_CONFIG_PATH", &self.config_path)
            .env("HOME", self.temp_dir.path())
            .env("NO_COLOR", "1")
            .env_remove("LINKSHELF_STATE_PATH")
            .env_remove("LINKSHELF_LOG");
        Ok(cmd)
    }

    /// Temp root
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
