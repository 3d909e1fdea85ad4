//! LinUCB contextual bandit over persisted per-item arms.
//!
//! ## Score
//! `θ·x + alpha * sqrt(xᵀ A⁻¹ x)` where `θ = A⁻¹ b`. An item seen for the
//! first time is seeded with `A = I`, `b = 0`, so its score is pure
//! exploration: `alpha * |x|`.
//!
//! ## Update
//! `A += x xᵀ`, `b += reward * x`, written back with compare-and-swap.
//! Same-item updates inside this process queue on a per-item async mutex.
//! Writers in other processes are caught by the version check and the update
//! is re-applied on fresh state.
//!
//! Missing or corrupt arms are treated as absent and reseeded.

use crate::arm::ArmState;
use crate::error::{BanditError, Result};
use crate::store::{ArmStore, SwapOutcome};
use catalog::ItemId;
use nalgebra::DVector;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Context length: user traits, item traits, absolute difference
pub const DEFAULT_DIMENSIONS: usize = 3 * taste::DIMENSIONS;
pub const DEFAULT_ALPHA: f64 = 0.6;
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Result of a successful update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmUpdate {
    /// Stored version after the write
    pub version: u64,
    /// Version conflicts retried before the write went through
    pub retries: u32,
}

struct LoadedArm {
    version: Option<u64>,
    state: ArmState,
    reseeded: bool,
}

pub struct LinUcb {
    store: Arc<dyn ArmStore>,
    dimensions: usize,
    alpha: f64,
    max_retries: u32,
    // Entries are removed once no update holds them
    item_locks: std::sync::Mutex<HashMap<ItemId, Arc<Mutex<()>>>>,
}

impl LinUcb {
    pub fn new(store: Arc<dyn ArmStore>) -> Self {
        Self {
            store,
            dimensions: DEFAULT_DIMENSIONS,
            alpha: DEFAULT_ALPHA,
            max_retries: DEFAULT_MAX_RETRIES,
            item_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Exploration width; larger values favour under-sampled items
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Upper confidence bound for an item in context `x`.
    ///
    /// A missing arm is seeded and persisted; a failure to persist the seed
    /// is logged and does not fail the score.
    #[instrument(skip(self, item, x), fields(item_id = %item))]
    pub async fn score(&self, item: &ItemId, x: &[f64]) -> Result<f64> {
        let x = self.check_context(x)?;
        let loaded = self.load(item).await?;

        if loaded.reseeded {
            match self
                .store
                .compare_and_swap(item, loaded.version, loaded.state.to_record())
                .await
            {
                Ok(SwapOutcome::Swapped { version }) => debug!(version, "Seeded arm"),
                // Someone else wrote it first; their state is as good as ours
                Ok(SwapOutcome::Conflict { .. }) => {}
                Err(e) => warn!(error = %e, "Failed to persist seeded arm"),
            }
        }

        let score = loaded
            .state
            .ucb(&x, self.alpha)
            .ok_or_else(|| BanditError::NotPositiveDefinite(item.clone()))?;
        debug!(score, "UCB computed");
        Ok(score)
    }

    /// Fold one observation into the item's arm.
    ///
    /// # Errors
    /// `Conflict` if the version check failed more than `max_retries` times,
    /// `Store` if the store itself failed.
    #[instrument(skip(self, item, x), fields(item_id = %item))]
    pub async fn update(&self, item: &ItemId, x: &[f64], reward: f64) -> Result<ArmUpdate> {
        let x = self.check_context(x)?;
        if !reward.is_finite() {
            return Err(BanditError::NonFinite);
        }

        // Released on drop, including when this future is cancelled while waiting
        let lease = ItemLockLease::acquire(self, item);
        let _guard = lease.lock.lock().await;
        self.update_locked(item, &x, reward).await
    }

    /// Effective state of an arm without persisting anything
    pub async fn state(&self, item: &ItemId) -> Result<ArmState> {
        Ok(self.load(item).await?.state)
    }

    async fn update_locked(&self, item: &ItemId, x: &DVector<f64>, reward: f64) -> Result<ArmUpdate> {
        for retries in 0..=self.max_retries {
            let LoadedArm {
                version, mut state, ..
            } = self.load(item).await?;
            state.apply(x, reward);

            match self
                .store
                .compare_and_swap(item, version, state.to_record())
                .await?
            {
                SwapOutcome::Swapped { version } => {
                    debug!(version, retries, reward, "Arm updated");
                    return Ok(ArmUpdate { version, retries });
                }
                SwapOutcome::Conflict { current } => {
                    debug!(expected = ?version, ?current, "Arm version conflict, retrying");
                }
            }
        }

        warn!(attempts = self.max_retries + 1, "Giving up on arm update");
        Err(BanditError::Conflict {
            item: item.clone(),
            attempts: self.max_retries + 1,
        })
    }

    async fn load(&self, item: &ItemId) -> Result<LoadedArm> {
        let stored = self.store.load(item).await?;
        let Some(stored) = stored else {
            return Ok(LoadedArm {
                version: None,
                state: ArmState::seeded(self.dimensions),
                reseeded: true,
            });
        };

        match ArmState::from_record(&stored.record, self.dimensions) {
            Some(state) => Ok(LoadedArm {
                version: Some(stored.version),
                state,
                reseeded: false,
            }),
            None => {
                warn!(item_id = %item, version = stored.version, "Corrupt arm state, reseeding");
                Ok(LoadedArm {
                    version: Some(stored.version),
                    state: ArmState::seeded(self.dimensions),
                    reseeded: true,
                })
            }
        }
    }

    fn check_context(&self, x: &[f64]) -> Result<DVector<f64>> {
        if x.len() != self.dimensions {
            return Err(BanditError::DimensionMismatch {
                expected: self.dimensions,
                found: x.len(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(BanditError::NonFinite);
        }
        Ok(DVector::from_column_slice(x))
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, HashMap<ItemId, Arc<Mutex<()>>>> {
        self.item_locks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared handle on one item's update mutex.
///
/// Dropping the last lease removes the item's entry from the lock table.
struct ItemLockLease<'a> {
    bandit: &'a LinUcb,
    item: &'a ItemId,
    lock: Arc<Mutex<()>>,
}

impl<'a> ItemLockLease<'a> {
    fn acquire(bandit: &'a LinUcb, item: &'a ItemId) -> Self {
        let lock = bandit.lock_table().entry(item.clone()).or_default().clone();
        Self { bandit, item, lock }
    }
}

impl Drop for ItemLockLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.bandit.lock_table();
        // The table's handle plus this lease's: nobody else is waiting
        if locks.get(self.item).is_some_and(|l| Arc::strong_count(l) == 2) {
            locks.remove(self.item);
        }
    }
}
