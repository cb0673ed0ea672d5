//! Library layout and link creation.
//!
//! Organizing a file happens in two steps:
//!
//! - [`plan::Planner`] turns resolved metadata into a [`DestinationPlan`]
//! - [`link::LinkOrganizer`] materializes that plan as a symlink or hardlink
//!
//! # Usage
//!
//! ```no_run
//! use linkshelf::classify::ContentKind;
//! use linkshelf::config::Config;
//! use linkshelf::organize::{LinkOrganizer, MediaIds, Planner, ResolvedMedia};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let media = ResolvedMedia {
//!     title: "Movie Title".to_string(),
//!     year: Some(2021),
//!     kind: ContentKind::Movie,
//!     anime: false,
//!     season: None,
//!     episode: None,
//!     ids: MediaIds { tmdb: Some("12345".to_string()), ..MediaIds::default() },
//! };
//!
//! let source = Path::new("/downloads/Movie.Title.2021.mkv");
//! let plan = Planner::from_config(&config).plan(source, &media);
//! LinkOrganizer::from_config(&config).create_link(source, &plan)?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod link;
pub mod plan;

pub use errors::LinkError;
pub use link::{LinkOrganizer, LinkOutcome};
pub use plan::{
    DestinationPlan, MediaIds, Planner, Quality, ResolvedMedia, detect_quality, sanitize_component,
};
