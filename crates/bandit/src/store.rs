//! Persistence contract for arm state, with an in-memory and a file-backed store.
//!
//! Every record carries a version that increases by one on each successful
//! write. `compare_and_swap` only writes when the caller saw the current
//! version, which gives an atomic per-item read-modify-write.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use catalog::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Persisted `(A, b)` pair for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmRecord {
    /// Row-major design matrix
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
    pub updated_at: DateTime<Utc>,
}

/// A record together with the version it was read at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord {
    pub version: u64,
    #[serde(flatten)]
    pub record: ArmRecord,
}

/// Outcome of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Write applied; the record is now at `version`
    Swapped { version: u64 },
    /// Someone else wrote first; `current` is what is stored now
    Conflict { current: Option<u64> },
}

/// Keyed store for arm state
#[async_trait]
pub trait ArmStore: Send + Sync {
    /// Current record for an item, if any
    async fn load(&self, item: &ItemId) -> StoreResult<Option<VersionedRecord>>;

    /// Write `record` only if the stored version equals `expected`.
    ///
    /// `expected = None` means the item must not exist yet.
    async fn compare_and_swap(
        &self,
        item: &ItemId,
        expected: Option<u64>,
        record: ArmRecord,
    ) -> StoreResult<SwapOutcome>;

    fn name(&self) -> &str;
}

fn swap_in(
    arms: &mut HashMap<ItemId, VersionedRecord>,
    item: &ItemId,
    expected: Option<u64>,
    record: ArmRecord,
) -> SwapOutcome {
    let current = arms.get(item).map(|r| r.version);
    if current != expected {
        return SwapOutcome::Conflict { current };
    }
    let version = current.map_or(1, |v| v + 1);
    arms.insert(item.clone(), VersionedRecord { version, record });
    SwapOutcome::Swapped { version }
}

/// Process-local store, mainly for tests and single-node setups
#[derive(Debug, Default)]
pub struct InMemoryArmStore {
    arms: RwLock<HashMap<ItemId, VersionedRecord>>,
}

impl InMemoryArmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replace a record, bumping its version
    pub async fn overwrite(&self, item: &ItemId, record: ArmRecord) -> u64 {
        let mut arms = self.arms.write().await;
        let version = arms.get(item).map_or(1, |r| r.version + 1);
        arms.insert(item.clone(), VersionedRecord { version, record });
        version
    }

    pub async fn len(&self) -> usize {
        self.arms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.arms.read().await.is_empty()
    }
}

#[async_trait]
impl ArmStore for InMemoryArmStore {
    async fn load(&self, item: &ItemId) -> StoreResult<Option<VersionedRecord>> {
        Ok(self.arms.read().await.get(item).cloned())
    }

    async fn compare_and_swap(
        &self,
        item: &ItemId,
        expected: Option<u64>,
        record: ArmRecord,
    ) -> StoreResult<SwapOutcome> {
        let mut arms = self.arms.write().await;
        Ok(swap_in(&mut arms, item, expected, record))
    }

    fn name(&self) -> &str {
        "InMemoryArmStore"
    }
}

/// Store that keeps all arms in one JSON snapshot file.
///
/// Each successful swap rewrites the snapshot to a temporary file and renames
/// it over the old one, so the file on disk is always a complete snapshot.
pub struct FileArmStore {
    path: PathBuf,
    arms: Mutex<HashMap<ItemId, VersionedRecord>>,
}

impl FileArmStore {
    /// Open a snapshot, starting empty when the file does not exist.
    ///
    /// Entries that cannot be decoded are dropped with a warning, the
    /// bandit then reseeds those items on next access.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let arms = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            decode_snapshot(&content, &path)
        } else {
            HashMap::new()
        };

        info!("Opened arm store {:?} with {} arms", path, arms.len());
        Ok(Self {
            path,
            arms: Mutex::new(arms),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_snapshot(&self, arms: &HashMap<ItemId, VersionedRecord>) -> StoreResult<()> {
        // Sorted keys keep the file diffable
        let ordered: BTreeMap<&str, &VersionedRecord> =
            arms.iter().map(|(k, v)| (k.as_str(), v)).collect();
        let json = serde_json::to_vec(&ordered)?;

        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

fn decode_snapshot(content: &str, path: &Path) -> HashMap<ItemId, VersionedRecord> {
    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(content) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Arm snapshot {:?} is unreadable, starting empty", path);
            return HashMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(id, value)| match serde_json::from_value::<VersionedRecord>(value) {
            Ok(record) => Some((ItemId::new(id), record)),
            Err(e) => {
                warn!(item_id = %id, error = %e, "Dropping undecodable arm record");
                None
            }
        })
        .collect()
}

#[async_trait]
impl ArmStore for FileArmStore {
    async fn load(&self, item: &ItemId) -> StoreResult<Option<VersionedRecord>> {
        Ok(self.arms.lock().await.get(item).cloned())
    }

    async fn compare_and_swap(
        &self,
        item: &ItemId,
        expected: Option<u64>,
        record: ArmRecord,
    ) -> StoreResult<SwapOutcome> {
        let mut arms = self.arms.lock().await;
        let previous = arms.get(item).cloned();

        let outcome = swap_in(&mut arms, item, expected, record);
        if let SwapOutcome::Swapped { version } = outcome {
            if let Err(e) = self.write_snapshot(&arms).await {
                // Keep memory and disk in agreement
                match previous {
                    Some(prev) => arms.insert(item.clone(), prev),
                    None => arms.remove(item),
                };
                return Err(e);
            }
            debug!(item_id = %item, version, "Arm snapshot written");
        }
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "FileArmStore"
    }
}
