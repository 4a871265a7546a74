//! Results returned by engine operations.

use std::collections::BTreeMap;

use marc_core::{Briefing, Message, Topic};
use serde::{Deserialize, Serialize};

/// Everything new for one agent since its last sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBatch {
    pub messages: Vec<Message>,
    /// Only topics that changed since the cursor, keyed by channel.
    pub topics: BTreeMap<String, Topic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub briefing: Option<Briefing>,
}

impl SyncBatch {
    /// True if nothing new was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.topics.is_empty() && self.briefing.is_none()
    }
}

/// Recent history and the topic of a channel just joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub history: Vec<Message>,
    pub topic: Option<Topic>,
}

/// First-contact response for a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub agent_id: String,
    pub briefing: Option<Briefing>,
}

/// Result of a rename. Conflicts are reported here, not as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub ok: bool,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenameOutcome {
    pub(crate) fn renamed(name: impl Into<String>) -> Self {
        Self {
            ok: true,
            name: name.into(),
            error: None,
        }
    }

    pub(crate) fn rejected(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            name: name.into(),
            error: Some(error.into()),
        }
    }
}
