//! Filter to remove duplicate catalog items from the pool.
//!
//! Retrieval collaborators can return the same movie twice, either under the
//! same id or as two records for one (title, year).

use crate::context::RankContext;
use crate::traits::Filter;
use anyhow::Result;
use catalog::{Candidate, ItemId};
use std::collections::HashSet;

/// Keeps the first occurrence of every item.
///
/// ## Algorithm
/// Two keys per candidate: the item id, and the trimmed lowercase title with
/// the year. A candidate matching either key of an earlier one is dropped.
/// Survivors keep their relative order.
pub struct DedupFilter;

impl Filter for DedupFilter {
    fn name(&self) -> &str {
        "DedupFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &RankContext) -> Result<Vec<Candidate>> {
        let mut seen_ids: HashSet<ItemId> = HashSet::with_capacity(candidates.len());
        let mut seen_titles: HashSet<(String, Option<i32>)> = HashSet::with_capacity(candidates.len());

        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                let title_key = candidate.title_key();
                if seen_ids.contains(&candidate.id) || seen_titles.contains(&title_key) {
                    return false;
                }
                seen_ids.insert(candidate.id.clone());
                seen_titles.insert(title_key);
                true
            })
            .collect();

        Ok(filtered)
    }
}
