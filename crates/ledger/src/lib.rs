//! # Ledger Crate
//!
//! Append-only log of shown and feedback events. The ranking flow reads it for
//! the recently-seen penalty; the feedback flow reads it to recover the feature
//! context an item was shown with.
//!
//! ## Main Components
//!
//! - **event**: `Event`, `EventType` and the default reward of each type
//! - **ledger**: the `EventLedger` contract
//! - **memory**: `InMemoryEventLedger`
//! - **jsonl**: `JsonlEventLedger`, one JSON event per line on disk

pub mod error;
pub mod event;
pub mod jsonl;
pub mod ledger;
pub mod memory;

// Re-export commonly used types for convenience
pub use error::{LedgerError, Result};
pub use event::{Event, EventType, FeatureContext, MAX_REWARD, MIN_REWARD};
pub use jsonl::{JsonlEventLedger, DEFAULT_RETENTION_DAYS};
pub use ledger::{default_lookback, EventLedger, DEFAULT_LOOKBACK_DAYS};
pub use memory::InMemoryEventLedger;
