//! Ordered cleaning rules applied to a separator-normalized name.
//!
//! Rules run top to bottom. Order matters: id tags go before the year pass so a
//! catalog id is never mistaken for a year, and episode markers cut the name
//! before quality tokens get a chance to.

use once_cell::sync::Lazy;
use regex::Regex;

/// What a rule does with its first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Replace every match with a single space.
    Strip,
    /// Drop the match and everything after it. Falls back to [`RuleAction::Strip`]
    /// when nothing meaningful precedes the match.
    CutFrom,
}

/// A single pattern → action entry of the cleaning table.
#[derive(Debug)]
pub struct CleanRule {
    /// Short identifier, used in debug logs.
    pub name: &'static str,
    /// Case-insensitive pattern.
    pub pattern: Regex,
    /// What to do with matches.
    pub action: RuleAction,
}

impl CleanRule {
    fn new(name: &'static str, pattern: &str, action: RuleAction) -> Self {
        Self {
            name,
            pattern: Regex::new(&format!("(?i){pattern}")).expect("cleaning rule must compile"),
            action,
        }
    }

    /// Applies the rule to `name`, returning the rewritten string.
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        match self.action {
            RuleAction::Strip => self.pattern.replace_all(name, " ").into_owned(),
            RuleAction::CutFrom => match self.pattern.find(name) {
                Some(m) if has_meaningful_text(&name[..m.start()]) => name[..m.start()].to_string(),
                Some(_) => self.pattern.replace(name, " ").into_owned(),
                None => name.to_string(),
            },
        }
    }
}

/// True when `prefix` holds at least one letter or digit.
pub(crate) fn has_meaningful_text(prefix: &str) -> bool {
    prefix.chars().any(char::is_alphanumeric)
}

/// Rules that run before the year pass.
pub static PRE_YEAR_RULES: Lazy<Vec<CleanRule>> = Lazy::new(|| {
    vec![CleanRule::new(
        "id_tag",
        r"[\[{](?:tmdb|imdb|tvdb)(?:id)?[-=: ][^\]}]*[\]}]",
        RuleAction::Strip,
    )]
});

/// Main cleaning table, applied after the year has been located and cut.
pub static CLEAN_RULES: Lazy<Vec<CleanRule>> = Lazy::new(|| {
    use RuleAction::{CutFrom, Strip};
    vec![
        CleanRule::new("bracket_group", r"\[[^\]]*\]", Strip),
        CleanRule::new("episode_marker", r"\bS\d{1,2}\s?E\d{1,3}(?:-?E\d{1,3})*\b", CutFrom),
        CleanRule::new("cross_marker", r"\b\d{1,2}x\d{1,3}\b", CutFrom),
        CleanRule::new("season_word", r"\bSeason\s*\d{1,2}\b", CutFrom),
        CleanRule::new("season_marker", r"\bS\d{1,2}\b", CutFrom),
        CleanRule::new("episode_word", r"\b(?:Episode|Ep)\s*\d{1,4}\b", CutFrom),
        CleanRule::new("resolution", r"\b\d{3,4}[pi]\b", CutFrom),
        CleanRule::new("quality", r"\b(?:4K|8K|UHD|FHD|QHD|HD)\b", CutFrom),
        CleanRule::new(
            "source",
            r"\b(?:HDTV|Blu-?Ray|BDRip|BRRip|DVDRip|HDRip|WEB-?DL|WEB-?Rip|REMUX|DVD)\b",
            CutFrom,
        ),
        CleanRule::new(
            "codec",
            r"\b(?:x26[45]|H\s?26[45]|HEVC|AVC|XviD|DivX|10bit|HDR(?:10)?)\b",
            CutFrom,
        ),
        CleanRule::new(
            "audio",
            r"\b(?:E?AC-?3|AAC|MP3|DTS(?:-HD)?|FLAC|TrueHD|Atmos|DDP?\d?)\b",
            CutFrom,
        ),
        CleanRule::new("service", r"\b(?:AMZN|HULU|DSNP|NETFLIX|NF|HMAX|ATVP)\b", CutFrom),
        CleanRule::new(
            "edition",
            r"\b(?:REPACK|PROPER|EXTENDED|UNRATED|THEATRICAL|Director'?s\s?Cut|IMAX)\b",
            CutFrom,
        ),
        CleanRule::new(
            "release_flags",
            r"\b(?:COMPLETE|LIMITED|INTERNAL|DUBBED|SUBBED|MULTI)\b",
            CutFrom,
        ),
        CleanRule::new("trailing_dash", r"\s-\s.*$", Strip),
        CleanRule::new("empty_parens", r"[(\[{]\s*[)\]}]", Strip),
        CleanRule::new("dangling", r"[\s\-(\[{,]+$", Strip),
    ]
});
