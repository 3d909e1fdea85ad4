//! Error types for the taste crate.
//!
//! Only quiz input can be rejected here. Everything else in the trait model
//! (missing dimensions, out-of-range values) is recovered with the neutral
//! default rather than surfaced.

use thiserror::Error;

/// Errors raised while turning quiz answers into a trait vector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TasteError {
    /// The answer list did not have one entry per trait dimension
    #[error("expected {expected} answers but found {found}")]
    AnswerCountMismatch { expected: usize, found: usize },

    /// An answer could not be read as a finite number
    #[error("answer {index} is not a finite number: {value}")]
    NonNumericAnswer { index: usize, value: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, TasteError>;
