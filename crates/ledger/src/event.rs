//! Immutable interaction events.

use crate::error::LedgerError;
use catalog::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use taste::TraitVector;
use uuid::Uuid;

/// Rewards are bounded to this range
pub const MIN_REWARD: f64 = -1.0;
pub const MAX_REWARD: f64 = 1.0;

/// What happened to an item in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Shown,
    Click,
    Save,
    Finish,
    Dismiss,
}

impl EventType {
    /// Reward used when the client does not send one
    pub fn default_reward(self) -> f64 {
        match self {
            EventType::Shown => 0.0,
            EventType::Click => 0.2,
            EventType::Save => 0.6,
            EventType::Finish => 1.0,
            EventType::Dismiss => -0.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Shown => "shown",
            EventType::Click => "click",
            EventType::Save => "save",
            EventType::Finish => "finish",
            EventType::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shown" => Ok(EventType::Shown),
            "click" => Ok(EventType::Click),
            "save" => Ok(EventType::Save),
            "finish" => Ok(EventType::Finish),
            "dismiss" => Ok(EventType::Dismiss),
            other => Err(LedgerError::UnknownEventType(other.to_string())),
        }
    }
}

/// User and item trait vectors that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureContext {
    pub user: TraitVector,
    pub item: TraitVector,
}

/// One append-only ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub session_id: String,
    pub item_id: ItemId,
    pub event_type: EventType,
    pub reward: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub context: Option<FeatureContext>,
}

impl Event {
    /// Create an event with the type's default reward
    pub fn new(session_id: impl Into<String>, item_id: ItemId, event_type: EventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            item_id,
            event_type,
            reward: event_type.default_reward(),
            timestamp: Utc::now(),
            context: None,
        }
    }

    /// A `shown` event carrying the features the item was ranked with
    pub fn shown(session_id: impl Into<String>, item_id: ItemId, context: FeatureContext) -> Self {
        Self::new(session_id, item_id, EventType::Shown).with_context(context)
    }

    /// Override the default reward; clamped to [-1, 1], non-finite values are ignored
    pub fn with_reward(mut self, reward: f64) -> Self {
        if reward.is_finite() {
            self.reward = reward.clamp(MIN_REWARD, MAX_REWARD);
        }
        self
    }

    pub fn with_context(mut self, context: FeatureContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rewards() {
        let item = ItemId::new("1");
        let reward = |t| Event::new("s", item.clone(), t).reward;
        assert_eq!(reward(EventType::Shown), 0.0);
        assert_eq!(reward(EventType::Click), 0.2);
        assert_eq!(reward(EventType::Save), 0.6);
        assert_eq!(reward(EventType::Finish), 1.0);
        assert_eq!(reward(EventType::Dismiss), -0.2);
    }

    #[test]
    fn test_explicit_reward_is_clamped() {
        let e = Event::new("s", ItemId::new("1"), EventType::Click).with_reward(3.0);
        assert_eq!(e.reward, 1.0);
        let e = Event::new("s", ItemId::new("1"), EventType::Click).with_reward(-7.0);
        assert_eq!(e.reward, -1.0);
        let e = Event::new("s", ItemId::new("1"), EventType::Click).with_reward(f64::NAN);
        assert_eq!(e.reward, 0.2);
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!("Finish".parse::<EventType>().unwrap(), EventType::Finish);
        assert!(matches!(
            "like".parse::<EventType>(),
            Err(LedgerError::UnknownEventType(_))
        ));
    }

    #[test]
    fn test_serialized_shape() {
        let e = Event::new("abc", ItemId::new("603"), EventType::Save);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["event_type"], "save");
        assert_eq!(json["item_id"], "603");
        assert!(json["context"].is_null());
    }
}
