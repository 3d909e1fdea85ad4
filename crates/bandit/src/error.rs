//! Error types for the bandit crate.

use catalog::ItemId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the persisted arm-state store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Arm store I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode arm snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Arm store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by `LinUcb` operations
#[derive(Error, Debug)]
pub enum BanditError {
    /// Context vector has the wrong length
    #[error("expected a context of {expected} features but found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Context or reward contains NaN or infinity
    #[error("context or reward is not finite")]
    NonFinite,

    /// Optimistic update kept losing the race for this item
    #[error("update for item {item} conflicted {attempts} times")]
    Conflict { item: ItemId, attempts: u32 },

    /// Design matrix could not be factorized
    #[error("design matrix for item {0} is not positive definite")]
    NotPositiveDefinite(ItemId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, BanditError>;

/// Result alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
