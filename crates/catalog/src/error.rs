//! Error types for the catalog crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the catalog collaborators (retrieval and enrichment)
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file was not a JSON list of entries
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The retrieval or enrichment backend did not answer
    #[error("Catalog backend unavailable: {0}")]
    Unavailable(String),

    /// Background scoring task panicked or was cancelled
    #[error("Catalog scoring task failed: {0}")]
    TaskFailed(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
