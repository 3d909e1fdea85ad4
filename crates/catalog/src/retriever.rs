//! Catalog retrieval: the collaborator that produces the raw candidate pool.
//!
//! `CatalogRetriever` is the contract the orchestrator consumes. `TraitCatalog`
//! is an in-memory implementation over a JSON catalog file that scores items by
//! static trait similarity.
//!
//! ## Algorithm (`TraitCatalog::top_matches`)
//! 1. Take the `prefilter` most popular entries
//! 2. Score each against the user vector with cosine similarity (in parallel)
//! 3. Sort by score descending and keep the top `limit`

use crate::error::{CatalogError, Result};
use crate::trait_mapping::traits_from_metadata;
use crate::types::{RawCandidate, RawId};
use async_trait::async_trait;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use taste::{similarity, TraitVector};
use tracing::{debug, info, instrument};

/// Source of the raw, statically scored candidate pool
#[async_trait]
pub trait CatalogRetriever: Send + Sync {
    /// Returns up to `limit` candidates ordered by static similarity.
    ///
    /// `prefilter` bounds how much of the catalog is scanned.
    async fn top_matches(
        &self,
        user: TraitVector,
        limit: usize,
        prefilter: usize,
    ) -> Result<Vec<RawCandidate>>;

    /// Retriever name for logging
    fn name(&self) -> &str;
}

/// One row of the persisted catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Option<RawId>,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub providers: Vec<String>,
    /// Stored traits; derived from metadata when absent
    #[serde(default)]
    pub traits: Option<TraitVector>,
}

struct IndexedEntry {
    entry: CatalogEntry,
    traits: TraitVector,
}

impl IndexedEntry {
    fn to_raw(&self, score: f64) -> RawCandidate {
        let e = &self.entry;
        RawCandidate {
            id: e.id.clone(),
            title: Some(e.title.clone()),
            year: e.year,
            traits: Some(self.traits),
            vector: None,
            match_score: Some(score),
            poster_url: e.poster_url.clone(),
            synopsis: e.overview.clone(),
            providers: e.providers.clone(),
            genres: e.genres.clone(),
            director: e.director.clone(),
        }
    }
}

/// In-memory catalog ordered by popularity
#[derive(Clone)]
pub struct TraitCatalog {
    // Shared so the scoring task can own a handle
    entries: Arc<Vec<IndexedEntry>>,
}

impl TraitCatalog {
    /// Build a catalog from entries, deriving traits where they are missing
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut indexed: Vec<IndexedEntry> = entries
            .into_iter()
            .map(|entry| {
                let traits = entry.traits.unwrap_or_else(|| {
                    traits_from_metadata(
                        &entry.genres,
                        &entry.keywords,
                        entry.vote_average,
                        entry.popularity,
                    )
                });
                IndexedEntry { entry, traits }
            })
            .collect();

        // Stable sort keeps file order among equally popular entries
        indexed.sort_by(|a, b| {
            b.entry
                .popularity
                .partial_cmp(&a.entry.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            entries: Arc::new(indexed),
        }
    }

    /// Load a catalog from a JSON file containing a list of entries
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&content)?;
        info!("Loaded {} catalog entries from {:?}", entries.len(), path);
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Synchronous scoring used by the async retriever implementation
    pub fn score_top(&self, user: &TraitVector, limit: usize, prefilter: usize) -> Vec<RawCandidate> {
        let scan = prefilter.min(self.entries.len());

        let mut scored: Vec<(usize, f64)> = self.entries[..scan]
            .par_iter()
            .enumerate()
            .map(|(i, e)| (i, similarity(user, &e.traits)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        debug!("Scanned {} entries, returning {}", scan, scored.len());
        scored
            .into_iter()
            .map(|(i, score)| self.entries[i].to_raw(score))
            .collect()
    }
}

#[async_trait]
impl CatalogRetriever for TraitCatalog {
    #[instrument(skip(self, user))]
    async fn top_matches(
        &self,
        user: TraitVector,
        limit: usize,
        prefilter: usize,
    ) -> Result<Vec<RawCandidate>> {
        let catalog = self.clone();
        tokio::task::spawn_blocking(move || catalog.score_top(&user, limit, prefilter))
            .await
            .map_err(|e| CatalogError::TaskFailed(e.to_string()))
    }

    fn name(&self) -> &str {
        "TraitCatalog"
    }
}
