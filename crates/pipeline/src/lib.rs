//! Ranking pipeline for movie candidates.
//!
//! This crate provides:
//! - Normalization of raw retrieval records into canonical `Candidate`s
//! - Filter trait and implementations for cleaning the candidate pool
//! - FilterPipeline for composing filters
//! - MmrReranker for relevance/diversity selection with a seen penalty
//! - Context features for the contextual bandit
//!
//! ## Architecture
//! The pipeline processes candidates in stages:
//! 1. `normalize` fills defaults once, at the retrieval boundary
//! 2. Filters remove duplicates and bound the pool
//! 3. The reranker picks the final top-k
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::filters::*;
//! use pipeline::{normalize, FilterPipeline, MmrReranker, RankContext};
//!
//! let context = RankContext::new(user).with_seen(seen_ids);
//! let pipeline = FilterPipeline::new()
//!     .add_filter(DedupFilter)
//!     .add_filter(PoolLimitFilter::new(80));
//!
//! let pool = pipeline.apply(normalize(raw).collect(), &context)?;
//! let top = MmrReranker::new(6, 0.72).select(pool, &context);
//! ```

pub mod context;
pub mod features;
pub mod filter_pipeline;
pub mod filters;
pub mod mmr;
pub mod normalize;
pub mod traits;

// Re-export main types
pub use context::RankContext;
pub use features::{context_vector, context_vectors, CONTEXT_DIMENSIONS};
pub use filter_pipeline::FilterPipeline;
pub use mmr::MmrReranker;
pub use normalize::{normalize, normalize_one};
pub use traits::Filter;
