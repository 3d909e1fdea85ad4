//! The event ledger contract.

use crate::error::Result;
use crate::event::{Event, EventType, FeatureContext};
use async_trait::async_trait;
use catalog::ItemId;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

/// Lookback used when a caller has no window of its own
pub const DEFAULT_LOOKBACK_DAYS: i64 = 14;

pub fn default_lookback() -> Duration {
    Duration::days(DEFAULT_LOOKBACK_DAYS)
}

/// Append-only event log, queryable by session and time.
///
/// Reads are not required to be linearizable with concurrent appends.
#[async_trait]
pub trait EventLedger: Send + Sync {
    async fn append(&self, event: Event) -> Result<()>;

    /// Events of one session at or after `since`, oldest first
    async fn session_events(&self, session_id: &str, since: DateTime<Utc>) -> Result<Vec<Event>>;

    fn name(&self) -> &str;

    /// Append several events, stopping at the first failure.
    ///
    /// Returns how many were appended.
    async fn append_all(&self, events: Vec<Event>) -> Result<usize> {
        let mut appended = 0;
        for event in events {
            self.append(event).await?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Items the session was shown or interacted with inside the window.
    ///
    /// A window reaching past the earliest representable time covers the
    /// whole history.
    async fn recent_item_ids(&self, session_id: &str, lookback: Duration) -> Result<HashSet<ItemId>> {
        let since = Utc::now()
            .checked_sub_signed(lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(self
            .session_events(session_id, since)
            .await?
            .into_iter()
            .map(|e| e.item_id)
            .collect())
    }

    /// Feature context of the most recent `shown` event for (session, item)
    async fn latest_context(&self, session_id: &str, item: &ItemId) -> Result<Option<FeatureContext>> {
        Ok(self
            .session_events(session_id, DateTime::<Utc>::MIN_UTC)
            .await?
            .into_iter()
            .filter(|e| e.event_type == EventType::Shown && &e.item_id == item)
            .filter_map(|e| e.context.map(|c| (e.timestamp, c)))
            .max_by_key(|(ts, _)| *ts)
            .map(|(_, c)| c))
    }
}
