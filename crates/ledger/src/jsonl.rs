//! Append-only JSON-lines event log.
//!
//! Every event is one line in the file. Reads are served from an in-memory
//! mirror grouped by session, which only keeps events inside the retention
//! window. The file itself is never rewritten.

use crate::error::{LedgerError, Result};
use crate::event::Event;
use crate::ledger::EventLedger;
use crate::memory::events_since;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// How long events stay readable from the mirror by default
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// The whole mirror is swept once per this many appends
const PRUNE_EVERY: usize = 1024;

pub struct JsonlEventLedger {
    path: PathBuf,
    file: Mutex<File>,
    sessions: RwLock<HashMap<String, Vec<Event>>>,
    retention: Duration,
    appends: AtomicUsize,
}

impl JsonlEventLedger {
    /// Open (or create) the log with the default retention window.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_retention(path, Duration::days(DEFAULT_RETENTION_DAYS))
    }

    /// Open (or create) the log and load the events inside `retention`.
    ///
    /// Lines that do not decode are skipped with a warning.
    pub fn open_with_retention(path: impl Into<PathBuf>, retention: Duration) -> Result<Self> {
        let path = path.into();
        let cutoff = retention_cutoff(retention);
        let io_err = |source| LedgerError::Io {
            path: path.clone(),
            source,
        };

        let mut sessions: HashMap<String, Vec<Event>> = HashMap::new();
        let mut loaded = 0usize;
        if path.exists() {
            let reader = BufReader::new(std::fs::File::open(&path).map_err(io_err)?);
            for (lineno, line) in reader.lines().enumerate() {
                let line = line.map_err(io_err)?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Event>(&line) {
                    Ok(event) if event.timestamp < cutoff => {}
                    Ok(event) => {
                        sessions.entry(event.session_id.clone()).or_default().push(event);
                        loaded += 1;
                    }
                    Err(e) => warn!(line = lineno + 1, error = %e, "Skipping corrupt event line"),
                }
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        info!("Opened event log {:?} with {} events", path, loaded);
        Ok(Self {
            file: Mutex::new(File::from_std(file)),
            sessions: RwLock::new(sessions),
            retention,
            appends: AtomicUsize::new(0),
            path,
        })
    }

    /// Drop mirrored events older than the retention window.
    ///
    /// Returns how many were dropped. The file is left untouched.
    pub async fn prune(&self) -> usize {
        let cutoff = retention_cutoff(self.retention);
        let mut sessions = self.sessions.write().await;
        let mut dropped = 0;
        sessions.retain(|_, events| {
            let before = events.len();
            events.retain(|e| e.timestamp >= cutoff);
            dropped += before - events.len();
            !events.is_empty()
        });
        debug!(dropped, sessions = sessions.len(), "Pruned event mirror");
        dropped
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn retention_cutoff(retention: Duration) -> DateTime<Utc> {
    Utc::now()
        .checked_sub_signed(retention)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[async_trait]
impl EventLedger for JsonlEventLedger {
    async fn append(&self, event: Event) -> Result<()> {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');

        {
            let mut file = self.file.lock().await;
            let io_err = |source| LedgerError::Io {
                path: self.path.clone(),
                source,
            };
            file.write_all(&line).await.map_err(io_err)?;
            file.flush().await.map_err(io_err)?;
        }

        self.sessions
            .write()
            .await
            .entry(event.session_id.clone())
            .or_default()
            .push(event);

        if (self.appends.fetch_add(1, Ordering::Relaxed) + 1) % PRUNE_EVERY == 0 {
            self.prune().await;
        }
        Ok(())
    }

    async fn session_events(&self, session_id: &str, since: DateTime<Utc>) -> Result<Vec<Event>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .map(|events| events_since(events, since))
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "JsonlEventLedger"
    }
}
