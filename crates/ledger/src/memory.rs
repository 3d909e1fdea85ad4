//! Process-local ledger.

use crate::error::Result;
use crate::event::Event;
use crate::ledger::EventLedger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Events grouped by session, in append order
#[derive(Debug, Default)]
pub struct InMemoryEventLedger {
    sessions: RwLock<HashMap<String, Vec<Event>>>,
}

impl InMemoryEventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

pub(crate) fn events_since(events: &[Event], since: DateTime<Utc>) -> Vec<Event> {
    let mut out: Vec<Event> = events.iter().filter(|e| e.timestamp >= since).cloned().collect();
    out.sort_by_key(|e| e.timestamp);
    out
}

#[async_trait]
impl EventLedger for InMemoryEventLedger {
    async fn append(&self, event: Event) -> Result<()> {
        self.sessions
            .write()
            .await
            .entry(event.session_id.clone())
            .or_default()
            .push(event);
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
        "InMemoryEventLedger"
    }
}
