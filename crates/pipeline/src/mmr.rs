//! Diversity reranking with Maximal Marginal Relevance.
//!
//! ## Algorithm
//! 1. Base score per candidate: its relevance score, or cosine similarity to
//!    the user when it has none
//! 2. Add a small symmetric jitter (ties only), then subtract the seen penalty
//!    for items the session saw recently
//! 3. Greedy selection: the first pick has the highest base score, every later
//!    pick maximizes `lambda * base - (1 - lambda) * max_sim`, where `max_sim`
//!    is the highest cosine similarity to anything already picked
//! 4. Returned candidates carry their base score clamped to [0, 1]
//!
//! Ties keep pool order: the earlier candidate wins.

use crate::context::RankContext;
use catalog::Candidate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use taste::{clamp01, similarity};
use tracing::debug;

pub const DEFAULT_K: usize = 6;
pub const DEFAULT_LAMBDA: f64 = 0.72;
pub const DEFAULT_SEEN_PENALTY: f64 = 0.10;
pub const DEFAULT_JITTER: f64 = 0.002;

struct Scored {
    candidate: Candidate,
    base: f64,
    max_sim: f64,
}

/// Greedy MMR reranker.
///
/// Jitter makes tie order vary between requests. Use `with_seed` for
/// reproducible output or `with_jitter(0.0)` to disable it.
#[derive(Debug, Clone)]
pub struct MmrReranker {
    k: usize,
    lambda: f64,
    seen_penalty: f64,
    jitter: f64,
    seed: Option<u64>,
}

impl MmrReranker {
    pub fn new(k: usize, lambda: f64) -> Self {
        Self {
            k,
            lambda: lambda.clamp(0.0, 1.0),
            seen_penalty: DEFAULT_SEEN_PENALTY,
            jitter: DEFAULT_JITTER,
            seed: None,
        }
    }

    pub fn with_seen_penalty(mut self, penalty: f64) -> Self {
        self.seen_penalty = penalty;
        self
    }

    /// Half-width of the uniform jitter; `0.0` disables it
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.abs();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Select up to `k` candidates from the pool.
    ///
    /// # Arguments
    /// * `candidates` - Deduplicated pool, in retrieval order
    /// * `context` - User vector and the session's recently seen ids
    ///
    /// # Returns
    /// At most `k` candidates, all from the input, with `score` overwritten
    pub fn select(&self, candidates: Vec<Candidate>, context: &RankContext) -> Vec<Candidate> {
        if candidates.is_empty() || self.k == 0 {
            return Vec::new();
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut pool: Vec<Scored> = candidates
            .into_iter()
            .map(|candidate| {
                let mut base = candidate
                    .score
                    .unwrap_or_else(|| similarity(&context.user, &candidate.traits));
                if self.jitter > 0.0 {
                    base += rng.random_range(-self.jitter..=self.jitter);
                }
                if context.is_seen(&candidate.id) {
                    base -= self.seen_penalty;
                }
                Scored {
                    candidate,
                    base,
                    max_sim: 0.0,
                }
            })
            .collect();

        let pool_size = pool.len();
        let mut picked: Vec<Scored> = Vec::with_capacity(self.k.min(pool_size));

        while !pool.is_empty() && picked.len() < self.k {
            let mut best_idx = 0;
            let mut best_score = f64::NEG_INFINITY;
            for (i, s) in pool.iter().enumerate() {
                let mmr = if picked.is_empty() {
                    s.base
                } else {
                    self.lambda * s.base - (1.0 - self.lambda) * s.max_sim
                };
                if mmr > best_score {
                    best_score = mmr;
                    best_idx = i;
                }
            }

            let chosen = pool.remove(best_idx);
            for s in pool.iter_mut() {
                let sim = similarity(&s.candidate.traits, &chosen.candidate.traits);
                s.max_sim = if picked.is_empty() { sim } else { s.max_sim.max(sim) };
            }
            picked.push(chosen);
        }

        debug!(
            "MMR selected {} of {} candidates (k={}, lambda={})",
            picked.len(),
            pool_size,
            self.k,
            self.lambda
        );

        picked
            .into_iter()
            .map(|s| {
                let mut candidate = s.candidate;
                candidate.score = Some(clamp01(s.base));
                candidate
            })
            .collect()
    }
}

impl Default for MmrReranker {
    fn default() -> Self {
        Self::new(DEFAULT_K, DEFAULT_LAMBDA)
    }
}
