//! Utility functions and helpers.
//!
//! - Ignore pattern matching for the scanner
//! - Timestamp helpers for state and listings
//! - [`paths`]: path manipulation (relative link targets, normalization)
//! - [`serialization`]: JSON persistence with atomic replace

/// Path manipulation and resolution utilities
pub mod paths;
/// JSON serialization and atomic file writes
pub mod serialization;

use glob::{MatchOptions, Pattern};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Determines if a path should be ignored based on glob patterns.
///
/// A pattern ending in `/` matches any directory component with that name.
/// Other patterns are matched against every component and against the whole
/// path, case-insensitively. Invalid patterns never match.
#[must_use]
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    patterns.iter().any(|pattern| {
        if let Some(dir_name) = pattern.strip_suffix('/') {
            return path
                .components()
                .any(|c| c.as_os_str().eq_ignore_ascii_case(dir_name));
        }

        let Ok(glob) = Pattern::new(pattern) else {
            return false;
        };

        glob.matches_with(&path_str, MATCH_OPTIONS)
            || path
                .components()
                .any(|c| glob.matches_with(&c.as_os_str().to_string_lossy(), MATCH_OPTIONS))
    })
}

/// Returns the current timestamp as seconds since the Unix epoch.
#[must_use]
pub fn get_current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Formats a timestamp in local time, or `never` for zero.
#[must_use]
pub fn format_timestamp(timestamp: i64) -> String {
    use chrono::{Local, TimeZone};

    if timestamp == 0 {
        return "never".to_string();
    }
    Local.timestamp_opt(timestamp, 0).single().map_or_else(
        || format!("invalid timestamp {timestamp}"),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
