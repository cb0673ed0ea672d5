//! From a new file to a library link.
//!
//! [`LinkPipeline`] runs the full chain for one file: classify, parse, look
//! the title up in the [`Catalog`], plan the destination and link it. Every
//! failure stays scoped to the file it happened on; the batch carries on and
//! reports counts.

use crate::catalog::Catalog;
use crate::classify::{Classification, ClassificationEngine, ContentKind, Decision};
use crate::config::Config;
use crate::error::ShelfError;
use crate::organize::{LinkError, LinkOrganizer, LinkOutcome, MediaIds, Planner, ResolvedMedia};
use crate::parser::{self, ParsedMediaName};
use crate::tracking::{ListMatch, MonitoredDirectory, ScannerLists};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

/// Result of processing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// A link exists at the destination now
    Linked(LinkOutcome),
    /// Nothing was linked; the file stays queued for a later attempt
    Skipped {
        /// Why the file was left alone
        reason: String,
    },
    /// Linking failed
    Failed {
        /// Error message
        reason: String,
        /// Whether retrying is pointless (source gone)
        consumed: bool,
    },
}

/// Counters and consumed files for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Files linked, including already-correct links
    pub processed: u64,
    /// Files whose link failed
    pub errors: u64,
    /// Files left alone
    pub skipped: u64,
    /// Files that should leave the pending queue
    pub consumed: Vec<PathBuf>,
    /// Destination of every link created or confirmed
    pub linked: Vec<PathBuf>,
}

impl BatchOutcome {
    /// Folds one file's outcome into the batch
    pub fn record(&mut self, file: &Path, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Linked(link) => {
                self.processed += 1;
                self.consumed.push(file.to_path_buf());
                self.linked.push(link.path().to_path_buf());
            }
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { consumed, .. } => {
                self.errors += 1;
                if *consumed {
                    self.consumed.push(file.to_path_buf());
                }
            }
        }
    }

    /// Files handled in this batch
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.processed + self.errors + self.skipped
    }
}

/// Turns files of a monitored directory into library entries
pub trait Pipeline: Send + Sync {
    /// Processes a single file
    fn process_file(&self, directory: &MonitoredDirectory, file: &Path) -> FileOutcome;

    /// Processes files in order and sums the outcomes
    fn process(&self, directory: &MonitoredDirectory, files: &[PathBuf]) -> BatchOutcome {
        let mut batch = BatchOutcome::default();
        for file in files {
            let outcome = self.process_file(directory, file);
            batch.record(file, &outcome);
        }
        batch
    }
}

static SEASON_FOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:season\s*\d+|s\d{1,2}|specials?|extras?|cd\s*\d+|disc\s*\d+)$")
        .expect("season folder pattern must compile")
});

/// Default pipeline: classify, parse, look up, plan, link
pub struct LinkPipeline {
    classifier: ClassificationEngine,
    catalog: Box<dyn Catalog>,
    planner: Planner,
    organizer: LinkOrganizer,
    lists: ScannerLists,
}

impl LinkPipeline {
    /// Assembles a pipeline from its parts
    #[must_use]
    pub fn new(
        classifier: ClassificationEngine,
        catalog: Box<dyn Catalog>,
        planner: Planner,
        organizer: LinkOrganizer,
    ) -> Self {
        Self {
            classifier,
            catalog,
            planner,
            organizer,
            lists: ScannerLists::default(),
        }
    }

    /// Title lists consulted before the keyword vote
    #[must_use]
    pub fn with_lists(mut self, lists: ScannerLists) -> Self {
        self.lists = lists;
        self
    }

    /// Pipeline configured from `config` around the given catalog
    #[must_use]
    pub fn from_config(config: &Config, catalog: Box<dyn Catalog>) -> Self {
        Self::new(
            ClassificationEngine::new(config.library.anime_scan),
            catalog,
            Planner::from_config(config),
            LinkOrganizer::from_config(config),
        )
        .with_lists(ScannerLists::from_config(&config.scan))
    }

    /// Link organizer used for the final step
    #[must_use]
    pub fn organizer(&self) -> &LinkOrganizer {
        &self.organizer
    }

    /// Works out what `file` is, without touching the destination
    ///
    /// A folder named in the title lists decides the kind and supplies the
    /// catalog id unless the folder itself is tagged with one.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::ParseAmbiguous`] when no title can be derived and
    /// [`ShelfError::ExternalLookupFailure`] when the catalog fails or has no match.
    pub fn resolve(&self, directory: &MonitoredDirectory, file: &Path) -> Result<ResolvedMedia, ShelfError> {
        let name = file_name(file);
        let classification = self.classify_with_context(file);
        let parsed = title_source(file, &directory.path);

        if parsed.clean_title.trim().is_empty() {
            return Err(ShelfError::ParseAmbiguous(name));
        }

        let listed = self.list_match(&directory.path, file);
        let kind = listed
            .as_ref()
            .map(|hit| hit.kind)
            .or_else(|| classification.kind())
            .unwrap_or(if parsed.season.is_some() || parsed.episode.is_some() {
                ContentKind::Tv
            } else {
                ContentKind::Movie
            });
        let anime = classification.anime || listed.as_ref().is_some_and(|hit| hit.anime);
        debug!(
            file = %name,
            kind = kind.as_str(),
            anime,
            listed = listed.is_some(),
            title = %parsed.clean_title,
            "file classified"
        );

        let tagged = directory
            .tagged_id_for(file)
            .or_else(|| listed.as_ref().and_then(|hit| hit.tmdb_id.as_deref()));
        let (title, year, ids) = match tagged {
            Some(id) => self.lookup_tagged(id, kind, &parsed)?,
            None => self.lookup_search(kind, &parsed)?,
        };

        let (season, episode) = match kind {
            ContentKind::Tv => (parsed.season, parsed.episode),
            ContentKind::Movie => (None, None),
        };

        Ok(ResolvedMedia {
            title,
            year,
            kind,
            anime,
            season,
            episode,
            ids,
        })
    }

    /// Nearest folder from the file up to the monitored root that a title list names
    fn list_match(&self, root: &Path, file: &Path) -> Option<ListMatch> {
        if self.lists.is_empty() {
            return None;
        }
        file.ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(root))
            .map(file_name)
            .filter(|folder| !folder.is_empty() && !SEASON_FOLDER.is_match(folder.trim()))
            .find_map(|folder| self.lists.lookup(&folder))
    }

    /// File name first, then the parent folder, then the whole path
    fn classify_with_context(&self, file: &Path) -> Classification {
        let mut classification = self.classifier.classify(&file_name(file));
        let parent = file.parent().map(file_name).unwrap_or_default();

        if classification.decision == Decision::Undecided && !parent.is_empty() {
            let from_parent = self.classifier.classify(&parent);
            classification.decision = from_parent.decision;
            if classification.decision == Decision::Undecided {
                classification.decision = self.classifier.classify(&file.to_string_lossy()).decision;
            }
        }
        if !classification.anime && !parent.is_empty() {
            classification.anime = self.classifier.is_anime(&parent);
        }
        classification
    }

    fn lookup_tagged(
        &self,
        id: &str,
        kind: ContentKind,
        parsed: &ParsedMediaName,
    ) -> Result<(String, Option<u16>, MediaIds), ShelfError> {
        let details = self
            .catalog
            .details(id, kind)
            .map_err(|e| ShelfError::ExternalLookupFailure {
                query: id.to_string(),
                reason: format!("{e:#}"),
            })?;

        let title = if details.name.trim().is_empty() {
            parsed.clean_title.clone()
        } else {
            details.name
        };
        let mut ids = details.ids;
        ids.tmdb.get_or_insert_with(|| id.to_string());
        Ok((title, details.year.or(parsed.year), ids))
    }

    fn lookup_search(
        &self,
        kind: ContentKind,
        parsed: &ParsedMediaName,
    ) -> Result<(String, Option<u16>, MediaIds), ShelfError> {
        let lookup_failure = |reason: String| ShelfError::ExternalLookupFailure {
            query: parsed.clean_title.clone(),
            reason,
        };

        let hits = self
            .catalog
            .search(&parsed.clean_title, parsed.year, kind)
            .map_err(|e| lookup_failure(format!("{e:#}")))?;
        let best = hits
            .into_iter()
            .next()
            .ok_or_else(|| lookup_failure("no match".to_string()))?;

        let mut ids = MediaIds::default();
        if let Some(id) = &best.id {
            // External ids are a bonus; a failed details call keeps the primary id
            match self.catalog.details(id, kind) {
                Ok(details) => ids = details.ids,
                Err(e) => debug!(id = %id, "details lookup failed: {e:#}"),
            }
            ids.tmdb.get_or_insert_with(|| id.clone());
        }

        Ok((best.name, best.year.or(parsed.year), ids))
    }
}

impl Pipeline for LinkPipeline {
    fn process_file(&self, directory: &MonitoredDirectory, file: &Path) -> FileOutcome {
        let _span = info_span!("file", path = %file.display()).entered();

        let media = match self.resolve(directory, file) {
            Ok(media) => media,
            Err(e) => {
                warn!("skipped: {e}");
                return FileOutcome::Skipped { reason: e.to_string() };
            }
        };

        let plan = self.planner.plan(file, &media);
        match self.organizer.create_link(file, &plan) {
            Ok(outcome) => {
                info!(destination = %outcome.path().display(), "linked");
                FileOutcome::Linked(outcome)
            }
            Err(e) => {
                let consumed = matches!(e, LinkError::SourceMissing { .. });
                FileOutcome::Failed {
                    reason: ShelfError::from(e).to_string(),
                    consumed,
                }
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}

/// Parses the file name, borrowing the title from an ancestor folder when
/// the name is only an episode marker (`S01E02.mkv` under `Show/Season 1`)
///
/// Only folders strictly below `root` are candidates. A bare episode marker
/// with no such folder leaves the title empty.
fn title_source(file: &Path, root: &Path) -> ParsedMediaName {
    let mut parsed = parser::parse(&file_name(file));
    let episode_marker = parser::extract_season_episode(&parsed.clean_title).0.is_some();
    if !episode_marker && parsed.clean_title.chars().any(char::is_alphabetic) {
        return parsed;
    }

    let folder = file
        .ancestors()
        .skip(1)
        .take_while(|dir| *dir != root && dir.starts_with(root))
        .map(file_name)
        .find(|name| !name.is_empty() && !SEASON_FOLDER.is_match(name.trim()));
    match folder {
        Some(folder) => {
            let from_folder = parser::parse(&folder);
            parsed.clean_title = from_folder.clean_title;
            parsed.year = parsed.year.or(from_folder.year);
            parsed.season = parsed.season.or(from_folder.season);
        }
        None if episode_marker => parsed.clean_title.clear(),
        None => {}
    }
    parsed
}
