//! Server crate for the MindMatch ranking core.
//!
//! This crate contains the orchestrator that coordinates all components
//! of the recommendation pipeline, its configuration, and the error and
//! outcome types callers see.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod outcome;

pub use config::RankingConfig;
pub use error::RecommendError;
pub use orchestrator::{
    FeedbackRequest, FeedbackResponse, Profile, RecommendResponse, RecommendationOrchestrator,
    ALGORITHM, ANONYMOUS_SESSION,
};
pub use outcome::StepOutcome;
