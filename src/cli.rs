//! Command-line interface definitions for shelf.
//!
//! Shared between the main binary and the xtask man page generator.
//! Field-level documentation lives in clap attributes, so missing_docs is
//! allowed here.

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for shelf.
#[derive(Parser)]
#[command(
    name = "shelf",
    version = crate::VERSION,
    about = "Watch download directories and link media into a tidy library",
    long_about = "Monitors download directories for new movies and episodes, \
                  works out what they are from their names and links them into \
                  a Movies / TV Shows library without moving the originals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show per-file detail and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start monitoring a directory
    Add {
        /// Directory to monitor
        path: PathBuf,

        /// Label shown in listings and notifications
        #[arg(short, long)]
        description: Option<String>,

        /// Link new files as soon as they appear instead of queueing them
        #[arg(short, long)]
        auto: bool,
    },

    /// Stop monitoring a directory
    #[command(alias = "rm")]
    Remove {
        /// Directory id or unique id prefix
        id: String,
    },

    /// List monitored directories
    #[command(alias = "ls")]
    List {
        /// Show known file counts, stats and pending files
        #[arg(short, long)]
        long: bool,
    },

    /// Pause monitoring of a directory
    Pause {
        /// Directory id or unique id prefix
        id: String,
    },

    /// Resume monitoring of a paused directory
    Resume {
        /// Directory id or unique id prefix
        id: String,
    },

    /// Drop all pending files of a directory
    ClearPending {
        /// Directory id or unique id prefix
        id: String,
    },

    /// Link the pending files of a directory
    Process {
        /// Directory id or unique id prefix
        id: String,
    },

    /// Run a single scan cycle over all directories
    Scan,

    /// Scan continuously in the foreground
    Watch {
        /// Time between cycles (e.g. 30s, 5m); defaults to core.scan_interval
        #[arg(short, long)]
        interval: Option<String>,

        /// Stop after this many seconds
        #[arg(long, value_name = "SECS")]
        for_secs: Option<u64>,
    },

    /// Relink library symlinks whose source has moved
    Repair {
        /// Extra directories to search for moved files
        #[arg(short, long = "search", value_name = "DIR")]
        search: Vec<PathBuf>,

        /// Only report broken links
        #[arg(long)]
        dry_run: bool,
    },

    /// Get and set configuration options
    Config {
        /// Configuration key (e.g., library.movie_folder)
        key: Option<String>,

        /// Value to set
        value: Option<String>,

        /// List all configuration values
        #[arg(short, long)]
        list: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
