//! Ranking configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest accepted seen-item window, in days
pub const MAX_SEEN_LOOKBACK_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Number of recommendations returned
    pub k: usize,
    /// Relevance/diversity trade-off for MMR, in [0, 1]
    pub mmr_lambda: f64,
    /// Subtracted from the base score of recently seen items
    pub seen_penalty: f64,
    /// Window for the recently seen lookup
    pub seen_lookback_days: i64,
    /// Half-width of the tie-breaking jitter; 0 disables it
    pub jitter: f64,
    /// Fixed jitter seed for reproducible rankings
    pub jitter_seed: Option<u64>,
    /// Size of the candidate pool requested from retrieval
    pub pool_limit: usize,
    /// How much of the catalog retrieval scans
    pub prefilter: usize,
    pub retrieval_timeout_ms: u64,
    /// LinUCB exploration width
    pub bandit_alpha: f64,
    /// Share of the UCB score folded into relevance; 0 keeps the bandit out of ranking
    pub bandit_weight: f64,
    /// Version conflicts tolerated per bandit update
    pub update_max_retries: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            k: 6,
            mmr_lambda: 0.72,
            seen_penalty: 0.10,
            seen_lookback_days: 21,
            jitter: 0.002,
            jitter_seed: None,
            pool_limit: 80,
            prefilter: 3000,
            retrieval_timeout_ms: 2000,
            bandit_alpha: 0.6,
            bandit_weight: 0.0,
            update_max_retries: 8,
        }
    }
}

impl RankingConfig {
    /// Load from a JSON file and validate
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.k > 0, "k must be positive");
        ensure!(
            (0.0..=1.0).contains(&self.mmr_lambda),
            "mmr_lambda must be in [0, 1], got {}",
            self.mmr_lambda
        );
        ensure!(
            (0.0..=1.0).contains(&self.bandit_weight),
            "bandit_weight must be in [0, 1], got {}",
            self.bandit_weight
        );
        ensure!(self.seen_penalty >= 0.0, "seen_penalty must not be negative");
        ensure!(self.jitter >= 0.0, "jitter must not be negative");
        ensure!(
            (0..=MAX_SEEN_LOOKBACK_DAYS).contains(&self.seen_lookback_days),
            "seen_lookback_days must be in [0, {}], got {}",
            MAX_SEEN_LOOKBACK_DAYS,
            self.seen_lookback_days
        );
        ensure!(self.pool_limit > 0, "pool_limit must be positive");
        ensure!(self.retrieval_timeout_ms > 0, "retrieval_timeout_ms must be positive");
        Ok(())
    }

    /// Seen-item window, clamped to the accepted range
    pub fn seen_lookback(&self) -> chrono::Duration {
        let days = self.seen_lookback_days.clamp(0, MAX_SEEN_LOOKBACK_DAYS);
        chrono::Duration::try_days(days).unwrap_or_else(chrono::Duration::zero)
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }
}
