//! # Bandit Crate
//!
//! LinUCB contextual bandit with per-item state kept in a pluggable store.
//!
//! ## Main Components
//!
//! - **linucb**: `LinUcb` score and update operations
//! - **arm**: `ArmState`, the `(A, b)` model of one item, solved by Cholesky
//! - **store**: `ArmStore` contract with `InMemoryArmStore` and `FileArmStore`
//!
//! ## Example Usage
//!
//! ```ignore
//! use bandit::{InMemoryArmStore, LinUcb};
//!
//! let bandit = LinUcb::new(Arc::new(InMemoryArmStore::new())).with_alpha(0.6);
//! let ucb = bandit.score(&item, &x).await?;
//! bandit.update(&item, &x, 1.0).await?;
//! ```

pub mod arm;
pub mod error;
pub mod linucb;
pub mod store;

// Re-export commonly used types for convenience
pub use arm::ArmState;
pub use error::{BanditError, Result, StoreError, StoreResult};
pub use linucb::{ArmUpdate, LinUcb, DEFAULT_ALPHA, DEFAULT_DIMENSIONS, DEFAULT_MAX_RETRIES};
pub use store::{ArmRecord, ArmStore, FileArmStore, InMemoryArmStore, SwapOutcome, VersionedRecord};
