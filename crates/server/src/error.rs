//! Request-level errors of the orchestrator.

use thiserror::Error;

/// The only failures a caller of `recommend`/`record_feedback` sees.
///
/// Everything else (cold start, store outages, enrichment) is recovered or
/// reported through a `StepOutcome`.
#[derive(Error, Debug)]
pub enum RecommendError {
    /// Rejected before any computation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No candidate pool could be obtained at all
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<taste::TasteError> for RecommendError {
    fn from(e: taste::TasteError) -> Self {
        RecommendError::InvalidInput(e.to_string())
    }
}
