//! Destination path construction.
//!
//! A [`DestinationPlan`] is the pure part of organizing: it only looks at the
//! resolved metadata and configuration, never at the filesystem.

use crate::classify::ContentKind;
use crate::config::{Config, IdConfig, LibraryConfig, QualityFolders, ResolutionConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Catalog identifiers attached to a title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaIds {
    /// Primary catalog id.
    pub tmdb: Option<String>,
    /// IMDb id (`tt…`).
    pub imdb: Option<String>,
    /// TVDB id.
    pub tvdb: Option<String>,
}

/// Everything known about a file once parsing and lookup are done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// Canonical title.
    pub title: String,
    /// Release year.
    pub year: Option<u16>,
    /// Movie or series.
    pub kind: ContentKind,
    /// Anime flag from classification.
    pub anime: bool,
    /// Season number, episodes only.
    pub season: Option<u32>,
    /// Episode number, episodes only.
    pub episode: Option<u32>,
    /// Catalog ids.
    pub ids: MediaIds,
}

/// Relative layout of one link below the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPlan {
    /// One of the four library buckets.
    pub category_folder: String,
    /// Quality bucket, when resolution organization is on for this kind.
    pub quality_folder: Option<String>,
    /// `Title (Year) [tmdb-…]`.
    pub title_folder: String,
    /// `Season NN` for episodes with a known season.
    pub season_folder: Option<String>,
    /// Link file name.
    pub file_name: String,
}

impl DestinationPlan {
    /// Path of the planned link below `root`.
    #[must_use]
    pub fn destination(&self, root: &Path) -> PathBuf {
        let mut path = root.join(&self.category_folder);
        if let Some(quality) = &self.quality_folder {
            path.push(quality);
        }
        path.push(&self.title_folder);
        if let Some(season) = &self.season_folder {
            path.push(season);
        }
        path.push(&self.file_name);
        path
    }
}

/// Quality bucket detected from a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Remux at 2160p.
    Remux2160,
    /// Remux at 1080p.
    Remux1080,
    /// Remux at another or unknown resolution.
    RemuxOther,
    /// 2160p / 4K / UHD.
    Uhd2160,
    /// 1080p / 1080i.
    Fhd1080,
    /// 720p.
    Hd720,
    /// 480p / 576p / SDTV.
    Sd480,
    /// DVD sources.
    Dvd,
    /// Nothing recognizable.
    Unknown,
}

static RES_2160: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:2160p|4k|uhd)\b").expect("2160p pattern must compile"));
static RES_1080: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:1080[pi]|full-?hd|fhd)\b").expect("1080p pattern must compile")
});
static RES_720: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b720p\b").expect("720p pattern must compile"));
static RES_480: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:480p|576p|sdtv)\b").expect("480p pattern must compile"));
static DVD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:dvd|dvdrip|dvd-?r|ntsc|pal)\b").expect("dvd pattern must compile")
});
static REMUX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bremux\b").expect("remux pattern must compile"));

/// Detects the quality bucket of a file or folder name.
#[must_use]
pub fn detect_quality(name: &str) -> Quality {
    let name = name.replace(['.', '_'], " ");
    let remux = REMUX.is_match(&name);

    if RES_2160.is_match(&name) {
        return if remux { Quality::Remux2160 } else { Quality::Uhd2160 };
    }
    if RES_1080.is_match(&name) {
        return if remux { Quality::Remux1080 } else { Quality::Fhd1080 };
    }
    if remux {
        return Quality::RemuxOther;
    }
    if RES_720.is_match(&name) {
        Quality::Hd720
    } else if RES_480.is_match(&name) {
        Quality::Sd480
    } else if DVD.is_match(&name) {
        Quality::Dvd
    } else {
        Quality::Unknown
    }
}

impl QualityFolders {
    /// Folder for a detected quality; unknown maps to the default bucket.
    #[must_use]
    pub fn folder_for(&self, quality: Quality) -> &str {
        match quality {
            Quality::Remux2160 => &self.remux_2160p,
            Quality::Remux1080 => &self.remux_1080p,
            Quality::RemuxOther => &self.remux_other,
            Quality::Uhd2160 => &self.uhd_2160p,
            Quality::Fhd1080 => &self.fhd_1080p,
            Quality::Hd720 => &self.hd_720p,
            Quality::Sd480 => &self.sd_480p,
            Quality::Dvd => &self.dvd,
            Quality::Unknown => &self.default,
        }
    }
}

/// Builds [`DestinationPlan`]s from configuration.
#[derive(Debug, Clone)]
pub struct Planner {
    library: LibraryConfig,
    resolution: ResolutionConfig,
    ids: IdConfig,
}

impl Planner {
    /// Captures the parts of `config` that affect layout.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            library: config.library.clone(),
            resolution: config.resolution.clone(),
            ids: config.ids.clone(),
        }
    }

    /// Plans where `source` should be linked.
    #[must_use]
    pub fn plan(&self, source: &Path, media: &ResolvedMedia) -> DestinationPlan {
        let original_name = source
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

        let quality_folder = self.quality_folder(source, media.kind);

        let season_folder = match (media.kind, media.season) {
            (ContentKind::Tv, Some(season)) => Some(format!("Season {season:02}")),
            _ => None,
        };

        let file_name = match (media.kind, media.season, media.episode) {
            (ContentKind::Tv, Some(s), Some(e)) if self.library.rename_episodes => {
                format!("S{s:02}E{e:02} - {original_name}")
            }
            _ => original_name,
        };

        DestinationPlan {
            category_folder: self.category_folder(media.kind, media.anime).to_string(),
            quality_folder,
            title_folder: self.title_folder(media),
            season_folder,
            file_name,
        }
    }

    /// Chooses among the four library buckets.
    #[must_use]
    pub fn category_folder(&self, kind: ContentKind, anime: bool) -> &str {
        let anime = anime && self.library.anime_separation;
        match (kind, anime) {
            (ContentKind::Movie, false) => &self.library.movie_folder,
            (ContentKind::Movie, true) => &self.library.anime_movie_folder,
            (ContentKind::Tv, false) => &self.library.tv_folder,
            (ContentKind::Tv, true) => &self.library.anime_tv_folder,
        }
    }

    fn quality_folder(&self, source: &Path, kind: ContentKind) -> Option<String> {
        let (enabled, folders) = match kind {
            ContentKind::Movie => (self.resolution.movies, &self.resolution.movie_folders),
            ContentKind::Tv => (self.resolution.shows, &self.resolution.show_folders),
        };
        if !enabled {
            return None;
        }

        // Release folders often carry the quality tag when the file name does not
        let mut quality = Quality::Unknown;
        for name in source.iter().rev().take(2) {
            quality = detect_quality(&name.to_string_lossy());
            if quality != Quality::Unknown {
                break;
            }
        }
        Some(folders.folder_for(quality).to_string())
    }

    /// `Title (Year) [tmdb-…] [imdb-…] [tvdb-…]` with disabled or missing ids left out.
    #[must_use]
    pub fn title_folder(&self, media: &ResolvedMedia) -> String {
        let mut folder = sanitize_component(&media.title);
        if let Some(year) = media.year {
            folder.push_str(&format!(" ({year})"));
        }
        let tag = self.id_tag(&media.ids);
        if !tag.is_empty() {
            folder.push(' ');
            folder.push_str(&tag);
        }
        folder
    }

    /// Rendered id tag, empty when no enabled id is present.
    #[must_use]
    pub fn id_tag(&self, ids: &MediaIds) -> String {
        let candidates = [
            (self.ids.tmdb, "tmdb", ids.tmdb.as_deref()),
            (self.ids.imdb, "imdb", ids.imdb.as_deref()),
            (self.ids.tvdb, "tvdb", ids.tvdb.as_deref()),
        ];

        candidates
            .iter()
            .filter_map(|(enabled, prefix, value)| match value {
                Some(v) if *enabled && !v.is_empty() => Some(format!("[{prefix}-{v}]")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));

/// Makes a title safe as a single path component on common filesystems.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let collapsed = WHITESPACE.replace_all(&replaced, " ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed.to_string()
    }
}
