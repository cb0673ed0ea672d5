//! Metadata catalog seam.
//!
//! The pipeline asks a [`Catalog`] to turn a parsed title into a canonical
//! name, year and external ids. Network-backed catalogs live outside this
//! crate; [`OfflineCatalog`] keeps the tool usable without one by echoing the
//! parsed values back.

use crate::classify::ContentKind;
use crate::organize::MediaIds;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    /// Catalog-native id (tmdb id for the built-in catalogs)
    pub id: Option<String>,
    /// Canonical title
    pub name: String,
    /// Release or first-air year
    pub year: Option<u16>,
}

/// Full record for a known id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDetails {
    /// Canonical title
    pub name: String,
    /// Release or first-air year
    pub year: Option<u16>,
    /// All known external ids
    pub ids: MediaIds,
}

/// Source of canonical titles and ids.
///
/// Implementations report failures as errors; the pipeline converts them to
/// `ShelfError::ExternalLookupFailure` and leaves the file pending.
pub trait Catalog: Send + Sync {
    /// Candidates for a parsed title, best first
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails
    fn search(&self, title: &str, year: Option<u16>, kind: ContentKind) -> Result<Vec<CatalogMatch>>;

    /// Record for an id taken from a tagged folder or an earlier search
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or the lookup fails
    fn details(&self, id: &str, kind: ContentKind) -> Result<CatalogDetails>;
}

/// Catalog that trusts the file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineCatalog;

impl Catalog for OfflineCatalog {
    fn search(&self, title: &str, year: Option<u16>, _kind: ContentKind) -> Result<Vec<CatalogMatch>> {
        if title.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![CatalogMatch {
            id: None,
            name: title.to_string(),
            year,
        }])
    }

    fn details(&self, id: &str, _kind: ContentKind) -> Result<CatalogDetails> {
        // Only the id is known; the pipeline keeps the parsed title
        Ok(CatalogDetails {
            name: String::new(),
            year: None,
            ids: MediaIds {
                tmdb: Some(id.to_string()),
                ..MediaIds::default()
            },
        })
    }
}

/// In-memory catalog with canned answers, for tests and dry runs.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    titles: HashMap<String, CatalogMatch>,
    details: HashMap<String, CatalogDetails>,
    failing: bool,
    lookups: Mutex<usize>,
}

impl StaticCatalog {
    /// Empty catalog: every search comes back with no hits
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog whose every lookup fails
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Registers a search answer, matched case-insensitively on the title
    #[must_use]
    pub fn with_title(mut self, query: &str, hit: CatalogMatch) -> Self {
        self.titles.insert(query.to_lowercase(), hit);
        self
    }

    /// Registers a details answer
    #[must_use]
    pub fn with_details(mut self, id: &str, details: CatalogDetails) -> Self {
        self.details.insert(id.to_string(), details);
        self
    }

    /// Number of lookups served so far
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.lock().map_or(0, |n| *n)
    }

    fn count(&self) {
        if let Ok(mut n) = self.lookups.lock() {
            *n += 1;
        }
    }
}

impl Catalog for StaticCatalog {
    fn search(&self, title: &str, _year: Option<u16>, _kind: ContentKind) -> Result<Vec<CatalogMatch>> {
        self.count();
        if self.failing {
            anyhow::bail!("catalog unavailable");
        }
        Ok(self.titles.get(&title.to_lowercase()).cloned().into_iter().collect())
    }

    fn details(&self, id: &str, _kind: ContentKind) -> Result<CatalogDetails> {
        self.count();
        if self.failing {
            anyhow::bail!("catalog unavailable");
        }
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown id {id}"))
    }
}
