//! Presence and roster views.

use serde::{Deserialize, Serialize};

use crate::message::Timestamp;

/// A live session: the capability token and the display name it speaks as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

/// A live session as shown in the roster, with its last activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveAgent {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<Timestamp>,
}

/// A named participant and when it was last active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<Timestamp>,
}

impl PresenceEntry {
    /// Whether the participant was active within `window_ms` of `now`.
    #[must_use]
    pub fn is_online(&self, now: Timestamp, window_ms: i64) -> bool {
        self.ts.is_some_and(|ts| now.saturating_sub(ts) <= window_ms)
    }
}

/// Channel listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub name: String,
    pub topic: Option<String>,
    pub member_count: usize,
}
