//! Filter that caps the size of the candidate pool.

use crate::context::RankContext;
use crate::traits::Filter;
use anyhow::Result;
use catalog::Candidate;

/// Keeps at most `limit` candidates from the head of the pool.
///
/// The reranker is quadratic in pool size, so the pool is bounded before it.
pub struct PoolLimitFilter {
    limit: usize,
}

impl PoolLimitFilter {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Filter for PoolLimitFilter {
    fn name(&self) -> &str {
        "PoolLimitFilter"
    }

    fn apply(&self, mut candidates: Vec<Candidate>, _context: &RankContext) -> Result<Vec<Candidate>> {
        candidates.truncate(self.limit);
        Ok(candidates)
    }
}
