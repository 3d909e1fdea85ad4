//! The `Filter` stage contract.

use crate::context::RankContext;
use anyhow::Result;
use catalog::Candidate;

/// One stage that narrows the candidate pool before reranking.
///
/// Stages are shared by every request, so they hold configuration only and
/// read per-request state from the `RankContext`. A stage may drop
/// candidates but must keep the survivors in their incoming order; the
/// reranker's tie-break depends on that order.
pub trait Filter: Send + Sync {
    /// Stage name used in pipeline logs
    fn name(&self) -> &str;

    /// Consume the pool and return the surviving candidates.
    ///
    /// # Arguments
    /// * `candidates` - Pool in retrieval order
    /// * `context` - User vector and seen set of the request
    fn apply(&self, candidates: Vec<Candidate>, context: &RankContext) -> Result<Vec<Candidate>>;
}
