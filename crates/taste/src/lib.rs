//! # Taste Crate
//!
//! The trait vector model shared by every other crate in the workspace.
//!
//! ## Main Components
//!
//! - **vector**: `TraitVector`, the fixed-order 9-dimension profile, and cosine similarity
//! - **answers**: quiz answers -> user trait vector
//! - **summary**: archetype and text description of a user profile
//! - **error**: input validation errors
//!
//! ## Example Usage
//!
//! ```ignore
//! use taste::{answers_to_traits, summarize};
//!
//! let user = answers_to_traits(&[0.8, 0.2, 0.5, 0.9, 0.1, 0.3, 0.7, 0.6, 0.4])?;
//! let summary = summarize(&user);
//! println!("{}: {}", summary.archetype, summary.text);
//! ```

pub mod answers;
pub mod error;
pub mod summary;
pub mod vector;

// Re-export commonly used types for convenience
pub use answers::{answers_to_traits, parse_answers, QUIZ_ORDER};
pub use error::{Result, TasteError};
pub use summary::{summarize, ProfileSummary};
pub use vector::{clamp01, similarity, Trait, TraitVector, DIMENSIONS, NEUTRAL};
