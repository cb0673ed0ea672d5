//! Movie / episode classification from name signals.
//!
//! Classification counts hits against two disjoint vocabularies and lets the
//! larger count win. A tie is reported as [`Decision::Undecided`] so the caller
//! can fall back to path context instead of guessing. Anime detection is a
//! separate pass and only affects which library bucket a file lands in.

use once_cell::sync::Lazy;
use regex::Regex;

/// Outcome of the movie vs. episode vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Single release.
    Movie,
    /// Part of a series.
    TvEpisode,
    /// Equal evidence on both sides, including no evidence at all.
    Undecided,
}

/// Library kind once a decision has been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Movies.
    Movie,
    /// Series and episodes.
    Tv,
}

impl ContentKind {
    /// Lowercase label used in logs and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

/// Full classification of one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Movie vs. episode decision.
    pub decision: Decision,
    /// Anime flag, orthogonal to `decision`.
    pub anime: bool,
    /// Number of episodic signals found.
    pub tv_score: u32,
    /// Number of single-release signals found.
    pub movie_score: u32,
}

impl Classification {
    /// Maps the decision to a [`ContentKind`], if one was reached.
    #[must_use]
    pub const fn kind(&self) -> Option<ContentKind> {
        match self.decision {
            Decision::Movie => Some(ContentKind::Movie),
            Decision::TvEpisode => Some(ContentKind::Tv),
            Decision::Undecided => None,
        }
    }
}

const TV_WORDS: &[&str] = &["episode", "episodes", "season", "seasons", "series", "complete"];

const MOVIE_WORDS: &[&str] = &[
    "film", "movie", "bluray", "blu-ray", "bdrip", "brrip", "dvdrip", "remux", "web-dl", "webdl",
    "hdrip",
];

const ANIME_WORDS: &[&str] = &[
    "anime",
    "アニメ",
    "japanese",
    "jpn",
    "horriblesubs",
    "subsplease",
    "erai-raws",
    "judas",
    "ember",
    "commie",
    "nyaa",
    "fansub",
    "dual-audio",
];

// Explicit SxxEyy counts double so it outweighs a lone source tag.
static EXPLICIT_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS\d{1,2}[ ._-]?E\d{1,3}").expect("episode pattern must compile"));

static CROSS_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d{1,2}x\d{1,3}\b").expect("cross pattern must compile"));

static SEASON_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS\d{1,2}\b").expect("season pattern must compile"));

static BRACKET_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]+\]").expect("bracket pattern must compile"));

static ABSOLUTE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s-\s\d{2,4}\b").expect("absolute number pattern must compile"));

static CRC_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[0-9A-Fa-f]{8}\]").expect("crc pattern must compile"));

/// Classifies names. Holds only the anime switch; cheap to copy.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationEngine {
    anime_scan: bool,
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ClassificationEngine {
    /// Creates an engine. With `anime_scan` off, the anime flag is always false.
    #[must_use]
    pub const fn new(anime_scan: bool) -> Self {
        Self { anime_scan }
    }

    /// Classifies a file or folder name.
    #[must_use]
    pub fn classify(&self, name: &str) -> Classification {
        let normalized = name.replace(['.', '_'], " ");
        let words = words(&normalized);

        let mut tv_score = count_words(&words, TV_WORDS);
        tv_score += 2 * u32::from(EXPLICIT_EPISODE.is_match(&normalized));
        tv_score += u32::from(CROSS_EPISODE.is_match(&normalized));
        if !EXPLICIT_EPISODE.is_match(&normalized) {
            tv_score += u32::from(SEASON_ONLY.is_match(&normalized));
        }

        let movie_score = count_words(&words, MOVIE_WORDS);

        let decision = match tv_score.cmp(&movie_score) {
            std::cmp::Ordering::Greater => Decision::TvEpisode,
            std::cmp::Ordering::Less => Decision::Movie,
            std::cmp::Ordering::Equal => Decision::Undecided,
        };

        Classification {
            decision,
            anime: self.is_anime(name),
            tv_score,
            movie_score,
        }
    }

    /// Anime pass: vocabulary, fansub bracket conventions, absolute numbering.
    #[must_use]
    pub fn is_anime(&self, name: &str) -> bool {
        if !self.anime_scan {
            return false;
        }

        let lower = name.to_lowercase();
        let normalized = lower.replace(['.', '_'], " ");
        let words = words(&normalized);
        if count_words(&words, ANIME_WORDS) > 0 {
            return true;
        }

        let brackets = BRACKET_GROUP.find_iter(name).count();
        if brackets >= 2 || CRC_TAG.is_match(name) {
            return true;
        }

        brackets >= 1 && ABSOLUTE_NUMBER.is_match(&normalized)
    }
}

fn words(normalized: &str) -> Vec<String> {
    normalized
        .split(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '{' | '}'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn count_words(words: &[String], vocabulary: &[&str]) -> u32 {
    let hits = words
        .iter()
        .filter(|w| vocabulary.contains(&w.as_str()))
        .count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}
