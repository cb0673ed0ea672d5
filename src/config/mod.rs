pub mod parser;
pub mod validator;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    /// What the scanner picks up
    #[serde(default)]
    pub scan: ScanConfig,

    /// Library bucket names and anime handling
    #[serde(default)]
    pub library: LibraryConfig,

    /// Optional quality subfolders
    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub links: LinkConfig,

    /// Which catalog ids end up in folder names
    #[serde(default)]
    pub ids: IdConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default = "default_destination_root")]
    pub destination_root: PathBuf,
    /// Polling interval in humantime notation ("15s", "2m")
    #[serde(default = "default_scan_interval")]
    pub scan_interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Folder holding `movies.txt`, `tv_series.txt`, `anime_movies.txt`, `anime_series.txt`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_movie_folder")]
    pub movie_folder: String,
    #[serde(default = "default_tv_folder")]
    pub tv_folder: String,
    #[serde(default = "default_anime_movie_folder")]
    pub anime_movie_folder: String,
    #[serde(default = "default_anime_tv_folder")]
    pub anime_tv_folder: String,
    #[serde(default = "default_true")]
    pub anime_scan: bool,
    #[serde(default = "default_true")]
    pub anime_separation: bool,
    /// Prefix episode files with `SxxEyy - `
    #[serde(default)]
    pub rename_episodes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub movies: bool,
    #[serde(default)]
    pub shows: bool,
    #[serde(default = "QualityFolders::movie_defaults")]
    pub movie_folders: QualityFolders,
    #[serde(default = "QualityFolders::show_defaults")]
    pub show_folders: QualityFolders,
}

/// Folder names per detected quality bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFolders {
    pub remux_2160p: String,
    pub remux_1080p: String,
    pub remux_other: String,
    pub uhd_2160p: String,
    pub fhd_1080p: String,
    pub hd_720p: String,
    pub sd_480p: String,
    pub dvd: String,
    pub default: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Symlink,
    Hardlink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_link_kind")]
    pub kind: LinkKind,
    /// Symlink targets relative to the link's directory
    #[serde(default)]
    pub relative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default = "default_true")]
    pub tmdb: bool,
    #[serde(default)]
    pub imdb: bool,
    #[serde(default)]
    pub tvdb: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            destination_root: default_destination_root(),
            scan_interval: default_scan_interval(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_patterns: default_ignore_patterns(),
            follow_symlinks: false,
            lists_dir: None,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            movie_folder: default_movie_folder(),
            tv_folder: default_tv_folder(),
            anime_movie_folder: default_anime_movie_folder(),
            anime_tv_folder: default_anime_tv_folder(),
            anime_scan: true,
            anime_separation: true,
            rename_episodes: false,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            movies: false,
            shows: false,
            movie_folders: QualityFolders::movie_defaults(),
            show_folders: QualityFolders::show_defaults(),
        }
    }
}

impl QualityFolders {
    #[must_use]
    pub fn movie_defaults() -> Self {
        Self {
            remux_2160p: "4KRemux".to_string(),
            remux_1080p: "1080pRemux".to_string(),
            remux_other: "MoviesRemux".to_string(),
            uhd_2160p: "UltraHD".to_string(),
            fhd_1080p: "FullHD".to_string(),
            hd_720p: "SDMovies".to_string(),
            sd_480p: "Retro480p".to_string(),
            dvd: "DVDClassics".to_string(),
            default: "Movies".to_string(),
        }
    }

    #[must_use]
    pub fn show_defaults() -> Self {
        Self {
            remux_2160p: "UltraHDRemuxShows".to_string(),
            remux_1080p: "1080pRemuxLibrary".to_string(),
            remux_other: "RemuxShows".to_string(),
            uhd_2160p: "UltraHD".to_string(),
            fhd_1080p: "FullHD".to_string(),
            hd_720p: "SDClassics".to_string(),
            sd_480p: "Retro480p".to_string(),
            dvd: "RetroDVD".to_string(),
            default: "Shows".to_string(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            kind: LinkKind::Symlink,
            relative: false,
        }
    }
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            tmdb: true,
            imdb: false,
            tvdb: false,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CoreConfig {
    /// Parsed polling interval.
    ///
    /// # Errors
    ///
    /// Returns an error if `scan_interval` is not a valid humantime duration.
    pub fn scan_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.scan_interval)
            .with_context(|| format!("Invalid scan interval: {}", self.scan_interval))
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A default file is written when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid values
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        parser::parse_config_file(path)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Get a configuration value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let (section, field) = key.split_once('.')?;

        match (section, field) {
            ("core", "state_path") => Some(self.core.state_path.display().to_string()),
            ("core", "destination_root") => Some(self.core.destination_root.display().to_string()),
            ("core", "scan_interval") => Some(self.core.scan_interval.clone()),
            ("scan", "extensions") => Some(self.scan.extensions.join(",")),
            ("scan", "ignore_patterns") => Some(self.scan.ignore_patterns.join(",")),
            ("scan", "follow_symlinks") => Some(self.scan.follow_symlinks.to_string()),
            ("scan", "lists_dir") => Some(
                self.scan
                    .lists_dir
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_default(),
            ),
            ("library", "movie_folder") => Some(self.library.movie_folder.clone()),
            ("library", "tv_folder") => Some(self.library.tv_folder.clone()),
            ("library", "anime_movie_folder") => Some(self.library.anime_movie_folder.clone()),
            ("library", "anime_tv_folder") => Some(self.library.anime_tv_folder.clone()),
            ("library", "anime_scan") => Some(self.library.anime_scan.to_string()),
            ("library", "anime_separation") => Some(self.library.anime_separation.to_string()),
            ("library", "rename_episodes") => Some(self.library.rename_episodes.to_string()),
            ("resolution", "movies") => Some(self.resolution.movies.to_string()),
            ("resolution", "shows") => Some(self.resolution.shows.to_string()),
            ("links", "kind") => Some(format!("{:?}", self.links.kind).to_lowercase()),
            ("links", "relative") => Some(self.links.relative.to_string()),
            ("ids", "tmdb") => Some(self.ids.tmdb.to_string()),
            ("ids", "imdb") => Some(self.ids.imdb.to_string()),
            ("ids", "tvdb") => Some(self.ids.tvdb.to_string()),
            ("notifications", "enabled") => Some(self.notifications.enabled.to_string()),
            _ => None,
        }
    }

    /// Every key accepted by [`Config::get`] and [`Config::set`].
    pub const KEYS: &'static [&'static str] = &[
        "core.state_path",
        "core.destination_root",
        "core.scan_interval",
        "scan.extensions",
        "scan.ignore_patterns",
        "scan.follow_symlinks",
        "scan.lists_dir",
        "library.movie_folder",
        "library.tv_folder",
        "library.anime_movie_folder",
        "library.anime_tv_folder",
        "library.anime_scan",
        "library.anime_separation",
        "library.rename_episodes",
        "resolution.movies",
        "resolution.shows",
        "links.kind",
        "links.relative",
        "ids.tmdb",
        "ids.imdb",
        "ids.tvdb",
        "notifications.enabled",
    ];

    /// Set a configuration value by key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key format is invalid (must be section.key)
    /// - The key is unknown
    /// - The value is invalid for the key
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let Some((section, field)) = key.split_once('.') else {
            anyhow::bail!("Invalid configuration key: {key}");
        };

        match (section, field) {
            ("core", "state_path") => self.core.state_path = PathBuf::from(value),
            ("core", "destination_root") => self.core.destination_root = PathBuf::from(value),
            ("core", "scan_interval") => {
                let interval = humantime::parse_duration(&value)
                    .with_context(|| format!("Invalid duration: {value}"))?;
                if interval.is_zero() {
                    anyhow::bail!("Scan interval must be greater than zero");
                }
                self.core.scan_interval = value;
            }
            ("scan", "extensions") => self.scan.extensions = split_list(&value),
            ("scan", "ignore_patterns") => self.scan.ignore_patterns = split_list(&value),
            ("scan", "follow_symlinks") => self.scan.follow_symlinks = parse_bool(&value)?,
            ("scan", "lists_dir") => {
                let value = value.trim();
                self.scan.lists_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            ("library", "movie_folder") => self.library.movie_folder = value,
            ("library", "tv_folder") => self.library.tv_folder = value,
            ("library", "anime_movie_folder") => self.library.anime_movie_folder = value,
            ("library", "anime_tv_folder") => self.library.anime_tv_folder = value,
            ("library", "anime_scan") => self.library.anime_scan = parse_bool(&value)?,
            ("library", "anime_separation") => self.library.anime_separation = parse_bool(&value)?,
            ("library", "rename_episodes") => self.library.rename_episodes = parse_bool(&value)?,
            ("resolution", "movies") => self.resolution.movies = parse_bool(&value)?,
            ("resolution", "shows") => self.resolution.shows = parse_bool(&value)?,
            ("links", "kind") => {
                self.links.kind = match value.to_lowercase().as_str() {
                    "symlink" => LinkKind::Symlink,
                    "hardlink" => LinkKind::Hardlink,
                    _ => anyhow::bail!("Link kind must be 'symlink' or 'hardlink', got: {value}"),
                };
            }
            ("links", "relative") => self.links.relative = parse_bool(&value)?,
            ("ids", "tmdb") => self.ids.tmdb = parse_bool(&value)?,
            ("ids", "imdb") => self.ids.imdb = parse_bool(&value)?,
            ("ids", "tvdb") => self.ids.tvdb = parse_bool(&value)?,
            ("notifications", "enabled") => self.notifications.enabled = parse_bool(&value)?,
            _ => anyhow::bail!("Unknown configuration key: {key}"),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("Invalid boolean: {value}"))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

// Default functions for serde
fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("linkshelf")
        .join("monitored.json")
}

fn default_destination_root() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home.join("Library")
}

fn default_scan_interval() -> String {
    "15s".to_string()
}

fn default_extensions() -> Vec<String> {
    [".mkv", ".mp4", ".avi", ".mov", ".wmv", ".flv", ".m4v", ".ts"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "*.part".to_string(),
        "*sample*".to_string(),
        ".@__thumb/".to_string(),
    ]
}

fn default_movie_folder() -> String {
    "Movies".to_string()
}

fn default_tv_folder() -> String {
    "TV Shows".to_string()
}

fn default_anime_movie_folder() -> String {
    "Anime Movies".to_string()
}

fn default_anime_tv_folder() -> String {
    "Anime Shows".to_string()
}

const fn default_link_kind() -> LinkKind {
    LinkKind::Symlink
}

const fn default_true() -> bool {
    true
}
