//! Explicit outcome of an optional, non-fatal step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an optional step (enrichment, event recording, bandit update) ended.
///
/// None of these fail the request; the caller gets to see which one happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    /// Not attempted, for a reason that is not an error
    Skipped { reason: String },
    /// Attempted and failed
    Failed { error: String },
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        StepOutcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Succeeded => write!(f, "succeeded"),
            StepOutcome::Skipped { reason } => write!(f, "skipped ({reason})"),
            StepOutcome::Failed { error } => write!(f, "failed ({error})"),
        }
    }
}
