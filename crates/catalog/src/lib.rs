//! # Catalog Crate
//!
//! Candidate types and the catalog-side collaborators consumed by the ranking core.
//!
//! ## Main Components
//!
//! - **types**: `RawCandidate` (retrieval output) and the canonical `Candidate`
//! - **retriever**: `CatalogRetriever` trait and the in-memory `TraitCatalog`
//! - **enrich**: `Enricher` trait for missing display metadata
//! - **trait_mapping**: genre/keyword heuristics producing item trait vectors
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogRetriever, TraitCatalog};
//!
//! let catalog = TraitCatalog::from_json_file(Path::new("catalog.json"))?;
//! let pool = catalog.top_matches(user_traits, 80, 3000).await?;
//! ```

pub mod enrich;
pub mod error;
pub mod retriever;
pub mod trait_mapping;
pub mod types;

// Re-export commonly used types for convenience
pub use enrich::{needs_enrichment, Enricher, PosterTable};
pub use error::{CatalogError, Result};
pub use retriever::{CatalogEntry, CatalogRetriever, TraitCatalog};
pub use trait_mapping::traits_from_metadata;
pub use types::{Candidate, CandidateMetadata, ItemId, RawCandidate, RawId};
