//! Candidate types at the retrieval boundary.
//!
//! Two shapes exist on purpose:
//! - `RawCandidate` is whatever the retrieval collaborator hands back. Every
//!   field is optional and a couple of historical spellings are accepted.
//! - `Candidate` is the one canonical shape the ranking pipeline works on.
//!   The normalizer in the `pipeline` crate is the only place that turns the
//!   first into the second.

use serde::{Deserialize, Serialize};
use std::fmt;
use taste::TraitVector;

/// Stable identity of a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// An identifier as it appears in upstream records: numeric or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    /// Canonical id, or `None` for blank text ids
    pub fn to_item_id(&self) -> Option<ItemId> {
        match self {
            RawId::Number(n) => Some(ItemId::from(*n)),
            RawId::Text(s) if s.trim().is_empty() => None,
            RawId::Text(s) => Some(ItemId::new(s.trim())),
        }
    }
}

/// Candidate record as produced by a retrieval collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default, alias = "tmdb_id")]
    pub id: Option<RawId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub traits: Option<TraitVector>,
    /// Older records carry the trait values under this name instead
    #[serde(default)]
    pub vector: Option<TraitVector>,
    #[serde(default, rename = "match")]
    pub match_score: Option<f64>,
    #[serde(default, alias = "posterUrl")]
    pub poster_url: Option<String>,
    #[serde(default, alias = "overview")]
    pub synopsis: Option<String>,
    #[serde(default, alias = "where_to_watch")]
    pub providers: Vec<String>,
    #[serde(default, alias = "genre")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
}

/// Display metadata carried through ranking untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub poster_url: Option<String>,
    pub synopsis: Option<String>,
    pub providers: Vec<String>,
    pub genres: Vec<String>,
    pub director: Option<String>,
}

/// A ranked item under consideration for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ItemId,
    pub title: String,
    pub year: Option<i32>,
    pub traits: TraitVector,
    /// Relevance score. `None` means the reranker recomputes it from traits.
    pub score: Option<f64>,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    /// Create a candidate with empty metadata
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, traits: TraitVector) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: None,
            traits,
            score: None,
            metadata: CandidateMetadata::default(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Secondary identity used for deduplication: trimmed lowercase title plus year
    pub fn title_key(&self) -> (String, Option<i32>) {
        (self.title.trim().to_lowercase(), self.year)
    }
}
