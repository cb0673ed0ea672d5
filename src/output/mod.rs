//! Terminal output for the `shelf` CLI.
//!
//! Human-facing messages go to stderr with a small set of styles; listings
//! go to stdout so they can be piped. Diagnostic logs are separate and flow
//! through `tracing`.

use colored::{ColoredString, Colorize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet = 0,
    /// Default.
    Normal = 1,
    /// Adds per-file detail.
    Verbose = 2,
}

static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the global verbosity level for all output functions.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Green message, hidden in quiet mode.
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.green());
}

/// Bold red message, always shown.
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

/// Bold yellow message, always shown.
pub fn warning(message: &str) {
    eprintln!("{}", message.yellow().bold());
}

/// Dimmed message, hidden in quiet mode.
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Dimmed message, shown only in verbose mode.
pub fn verbose(message: &str) {
    if get_verbosity() != Verbosity::Verbose {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// `linked  Movies/Heat (1995)/Heat.mkv` style line.
pub fn action(verb: &str, message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{:>8} {}", verb.dimmed().bold(), message);
}

/// Coloured `active`/`paused` label for listings.
#[must_use]
pub fn status_label(active: bool) -> ColoredString {
    if active {
        "active".green()
    } else {
        "paused".yellow()
    }
}

/// Aligned `label: value` line for detail views.
#[must_use]
pub fn field(label: &str, value: &str) -> String {
    format!("  {:<14} {}", format!("{label}:").dimmed(), value)
}

/// Short form of a directory id for listings.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
