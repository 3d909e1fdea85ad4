//! Context features for the contextual bandit.
//!
//! The bandit sees one vector per (user, item) pair: the user's traits, the
//! item's traits and their elementwise absolute difference, in that order.

use catalog::{Candidate, ItemId};
use rayon::prelude::*;
use taste::{TraitVector, DIMENSIONS};

/// Length of a context vector
pub const CONTEXT_DIMENSIONS: usize = 3 * DIMENSIONS;

/// Build `concat(u, v, |u - v|)` for one user/item pair.
pub fn context_vector(user: &TraitVector, item: &TraitVector) -> Vec<f64> {
    let u = user.as_array();
    let v = item.as_array();

    let mut x = Vec::with_capacity(CONTEXT_DIMENSIONS);
    x.extend_from_slice(u);
    x.extend_from_slice(v);
    x.extend(u.iter().zip(v.iter()).map(|(a, b)| (a - b).abs()));
    x
}

/// Context vectors for every candidate, computed in parallel and returned in input order.
pub fn context_vectors(user: &TraitVector, candidates: &[Candidate]) -> Vec<(ItemId, Vec<f64>)> {
    candidates
        .par_iter()
        .map(|c| (c.id.clone(), context_vector(user, &c.traits)))
        .collect()
}
