//! Optional display-metadata enrichment.

use crate::error::Result;
use crate::types::Candidate;
use async_trait::async_trait;
use std::collections::HashMap;

/// Fills in missing display metadata (posters, synopsis) for a candidate
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Returns an enriched copy of the candidate
    async fn enrich(&self, candidate: &Candidate) -> Result<Candidate>;

    fn name(&self) -> &str;
}

/// True when a required display field is absent
pub fn needs_enrichment(candidate: &Candidate) -> bool {
    candidate
        .metadata
        .poster_url
        .as_deref()
        .is_none_or(|url| url.trim().is_empty())
}

/// Enricher backed by a fixed poster lookup table keyed by item id
#[derive(Debug, Clone, Default)]
pub struct PosterTable {
    posters: HashMap<String, String>,
}

impl PosterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a poster url for an item
    pub fn with_poster(mut self, id: impl Into<String>, url: impl Into<String>) -> Self {
        self.posters.insert(id.into(), url.into());
        self
    }
}

#[async_trait]
impl Enricher for PosterTable {
    async fn enrich(&self, candidate: &Candidate) -> Result<Candidate> {
        let mut enriched = candidate.clone();
        if let Some(url) = self.posters.get(candidate.id.as_str()) {
            enriched.metadata.poster_url = Some(url.clone());
        }
        Ok(enriched)
    }

    fn name(&self) -> &str {
        "PosterTable"
    }
}
