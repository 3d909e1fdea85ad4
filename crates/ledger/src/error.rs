//! Error types for the ledger crate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Event log I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, LedgerError>;
