//! Ordered composition of `Filter` stages.

use crate::context::RankContext;
use crate::traits::Filter;
use anyhow::{Context, Result};
use catalog::Candidate;
use tracing::debug;

/// Runs its stages in insertion order, feeding each one the previous output.
///
/// ```ignore
/// let stages = FilterPipeline::new()
///     .add_filter(DedupFilter)
///     .add_filter(PoolLimitFilter::new(80));
/// let pool = stages.apply(normalize(raw).collect(), &context)?;
/// ```
#[derive(Default)]
pub struct FilterPipeline {
    stages: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn add_filter(mut self, stage: impl Filter + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Pass the pool through every stage.
    ///
    /// A failing stage aborts the run; its name is attached to the error.
    pub fn apply(&self, candidates: Vec<Candidate>, context: &RankContext) -> Result<Vec<Candidate>> {
        self.stages.iter().try_fold(candidates, |pool, stage| -> Result<Vec<Candidate>> {
            let before = pool.len();
            let pool = stage
                .apply(pool, context)
                .with_context(|| format!("filter stage {} failed", stage.name()))?;
            debug!(stage = stage.name(), before, after = pool.len(), "Filter stage applied");
            Ok(pool)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DedupFilter, PoolLimitFilter};
    use taste::TraitVector;

    fn candidate(id: &str, title: &str) -> Candidate {
        Candidate::new(id, title, TraitVector::neutral())
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let context = RankContext::default();

        let candidates = vec![candidate("1", "Heat"), candidate("2", "Ronin")];

        let filtered = pipeline.apply(candidates, &context).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filters_run_in_order() {
        let pipeline = FilterPipeline::new()
            .add_filter(DedupFilter)
            .add_filter(PoolLimitFilter::new(2));
        assert_eq!(pipeline.stage_names(), vec!["DedupFilter", "PoolLimitFilter"]);

        let candidates = vec![
            candidate("1", "Heat"),
            candidate("1", "Heat"),
            candidate("2", "Ronin"),
            candidate("3", "Collateral"),
        ];

        // Dedup first, so the limit keeps two distinct items
        let filtered = pipeline.apply(candidates, &RankContext::default()).unwrap();
        let ids: Vec<_> = filtered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
