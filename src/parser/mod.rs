//! Filename parsing: clean title, release year, season and episode numbers.
//!
//! Parsing is a pure function of the input string. Nothing here touches the
//! filesystem, so the same code handles file names and folder names.
//!
//! # Examples
//!
//! ```
//! use linkshelf::parser::parse;
//!
//! let parsed = parse("Show.Name.S02E05.1080p.WEB-DL.x264-GROUP.mkv");
//! assert_eq!(parsed.clean_title, "Show Name");
//! assert_eq!(parsed.season, Some(2));
//! assert_eq!(parsed.episode, Some(5));
//! assert_eq!(parsed.year, None);
//! ```

pub mod rules;

use once_cell::sync::Lazy;
use regex::Regex;
use rules::{CLEAN_RULES, PRE_YEAR_RULES, has_meaningful_text};
use tracing::trace;

/// Metadata derived from a raw file or folder name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedMediaName {
    /// Title with release noise removed.
    pub clean_title: String,
    /// Release year in 1900..=2099, when one was found.
    pub year: Option<u16>,
    /// Season number for episodic content.
    pub season: Option<u32>,
    /// Episode number for episodic content.
    pub episode: Option<u32>,
}

impl ParsedMediaName {
    /// True when both season and episode were recovered.
    #[must_use]
    pub const fn is_episode(&self) -> bool {
        self.season.is_some() && self.episode.is_some()
    }
}

static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2})[ ._-]?E(\d{1,3})").expect("season/episode pattern must compile")
});

static CROSS_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})x(\d{1,3})\b").expect("cross episode pattern must compile")
});

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year pattern must compile"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));

/// Parses a raw file or folder name.
///
/// Leading directories are ignored. The extension is dropped only when the
/// trailing suffix looks like one (2 to 4 alphanumerics with at least one letter).
#[must_use]
pub fn parse(raw: &str) -> ParsedMediaName {
    let stem = strip_extension(base_name(raw));
    let (season, episode) = extract_season_episode(stem);

    let mut working = normalize_separators(stem);
    for rule in PRE_YEAR_RULES.iter() {
        working = rule.apply(&working);
    }

    let year = match find_year(&working) {
        Some((value, start, end)) => {
            if has_meaningful_text(&working[..start]) {
                working.truncate(start);
            } else {
                working.replace_range(start..end, " ");
            }
            Some(value)
        }
        None => None,
    };

    for rule in CLEAN_RULES.iter() {
        let next = rule.apply(&working);
        if next != working {
            trace!(rule = rule.name, before = %working, after = %next, "cleaning rule applied");
        }
        working = next;
    }

    let mut clean_title = collapse_whitespace(&working);
    if clean_title.is_empty() {
        clean_title = collapse_whitespace(&normalize_separators(stem));
    }

    ParsedMediaName {
        clean_title,
        year,
        season,
        episode,
    }
}

/// Returns the first season/episode pair, preferring `SxxEyy` over `NxNN`.
#[must_use]
pub fn extract_season_episode(name: &str) -> (Option<u32>, Option<u32>) {
    let caps = SEASON_EPISODE
        .captures(name)
        .or_else(|| CROSS_EPISODE.captures(name));

    match caps {
        Some(c) => (
            c.get(1).and_then(|m| m.as_str().parse().ok()),
            c.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    }
}

/// Finds the release year and its byte range inside `name`.
///
/// A year at the very start is treated as part of the title when another
/// candidate follows it, or when nothing meaningful follows it at all
/// (`1917.mkv`, `2012.1080p.mkv`).
fn find_year(name: &str) -> Option<(u16, usize, usize)> {
    let mut candidates = YEAR.captures_iter(name).filter_map(|c| {
        let m = c.get(1)?;
        let value: u16 = m.as_str().parse().ok()?;
        Some((value, m.start(), m.end()))
    });

    let first = candidates.next()?;
    if has_meaningful_text(&name[..first.1]) {
        return Some(first);
    }

    if let Some(next) = candidates.next() {
        return Some(next);
    }

    let rest = CLEAN_RULES
        .iter()
        .fold(name[first.2..].to_string(), |acc, rule| rule.apply(&acc));
    has_meaningful_text(&rest).then_some(first)
}

fn base_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (2..=4).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic()) =>
        {
            stem
        }
        _ => name,
    }
}

fn normalize_separators(name: &str) -> String {
    name.replace(['.', '_'], " ")
}

fn collapse_whitespace(name: &str) -> String {
    WHITESPACE.replace_all(name.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_release() {
        let parsed = parse("Show.Name.S02E05.1080p.WEB-DL.x264-GROUP.mkv");
        assert_eq!(parsed.clean_title, "Show Name");
        assert_eq!(parsed.season, Some(2));
        assert_eq!(parsed.episode, Some(5));
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn test_movie_with_id_tag() {
        let parsed = parse("Movie Title (2021) [tmdb-12345].mkv");
        assert_eq!(parsed.clean_title, "Movie Title");
        assert_eq!(parsed.year, Some(2021));
        assert!(!parsed.is_episode());
    }

    #[test]
    fn test_year_only_title() {
        let parsed = parse("1917.mkv");
        assert_eq!(parsed.clean_title, "1917");
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn test_leading_year_with_release_year() {
        let parsed = parse("2001.A.Space.Odyssey.1968.1080p.BluRay.mkv");
        assert_eq!(parsed.clean_title, "2001 A Space Odyssey");
        assert_eq!(parsed.year, Some(1968));
    }

    #[test]
    fn test_cross_notation_episode() {
        let parsed = parse("Some Show 3x07 Title.avi");
        assert_eq!(parsed.season, Some(3));
        assert_eq!(parsed.episode, Some(7));
        assert_eq!(parsed.clean_title, "Some Show");
    }

    #[test]
    fn test_single_digit_cross_episode() {
        let parsed = parse("Show.Name.1x5.mkv");
        assert_eq!(parsed.clean_title, "Show Name");
        assert_eq!((parsed.season, parsed.episode), (Some(1), Some(5)));
    }

    #[test]
    fn test_group_suffix_goes_with_release_tail() {
        assert_eq!(parse("Movie.Name.1080p.x264-GROUP.mkv").clean_title, "Movie Name");
        assert_eq!(parse("Movie.Name.2019.WEB-DL-GROUP.mkv").clean_title, "Movie Name");
        // Without a release token the hyphen may belong to the title
        assert_eq!(parse("Spider-Man.mkv").clean_title, "Spider-Man");
    }

    #[test]
    fn test_resolution_is_not_cross_notation() {
        let parsed = parse("Film.1920x1080.mkv");
        assert_eq!(parsed.season, None);
        assert_eq!(parsed.episode, None);
    }

    #[test]
    fn test_first_marker_wins() {
        let (season, episode) = extract_season_episode("Show S01E02 S03E04");
        assert_eq!((season, episode), (Some(1), Some(2)));
    }

    #[test]
    fn test_directory_prefix_ignored() {
        let parsed = parse("/downloads/Other.Show.2019/Other.Show.2019.720p.HDTV.mkv");
        assert_eq!(parsed.clean_title, "Other Show");
        assert_eq!(parsed.year, Some(2019));
    }

    #[test]
    fn test_folder_name_without_extension() {
        let parsed = parse("Movie.Name.2019");
        assert_eq!(parsed.clean_title, "Movie Name");
        assert_eq!(parsed.year, Some(2019));
    }

    #[test]
    fn test_out_of_range_year_ignored() {
        let parsed = parse("Film 1850.mkv");
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.clean_title, "Film 1850");
    }
}
