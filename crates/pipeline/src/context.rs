//! Per-request ranking context shared by filters and the reranker.

use catalog::ItemId;
use std::collections::HashSet;
use taste::TraitVector;

/// What the pipeline knows about the requesting user
#[derive(Debug, Clone, Default)]
pub struct RankContext {
    /// The user's trait vector derived from quiz answers
    pub user: TraitVector,
    /// Items the session was shown or interacted with inside the lookback window
    pub seen: HashSet<ItemId>,
}

impl RankContext {
    pub fn new(user: TraitVector) -> Self {
        Self {
            user,
            seen: HashSet::new(),
        }
    }

    pub fn with_seen(mut self, seen: HashSet<ItemId>) -> Self {
        self.seen = seen;
        self
    }

    pub fn is_seen(&self, id: &ItemId) -> bool {
        self.seen.contains(id)
    }
}
