//! Persistence trait and the persisted document.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{Briefing, Message, MessageId, Timestamp, Topic};

/// The whole relay state as one document.
///
/// Every map is optional on disk; anything missing loads as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    /// Log in append order.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Agent name -> sync watermark.
    #[serde(default)]
    pub cursors: BTreeMap<String, Timestamp>,
    /// Agent name -> joined channels, in join order.
    #[serde(default)]
    pub joined: BTreeMap<String, Vec<String>>,
    /// Agent name -> last activity.
    #[serde(default)]
    pub last_seen: BTreeMap<String, Timestamp>,
    /// Channel -> topic.
    #[serde(default)]
    pub topics: BTreeMap<String, Topic>,
    #[serde(default)]
    pub briefing: Option<Briefing>,
    /// Next id to hand out. Zero on disk means "unknown".
    #[serde(default)]
    pub next_id: MessageId,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            cursors: BTreeMap::new(),
            joined: BTreeMap::new(),
            last_seen: BTreeMap::new(),
            topics: BTreeMap::new(),
            briefing: None,
            next_id: 1,
        }
    }
}

impl StoreData {
    /// Repair a freshly loaded document.
    ///
    /// `next_id` is raised above every stored id so ids are never reused,
    /// even when the counter was missing or stale on disk.
    pub fn normalize(&mut self) {
        let floor = self.messages.iter().map(|m| m.id).max().map_or(1, |id| id + 1);
        self.next_id = self.next_id.max(floor);
    }

    /// Latest timestamp recorded anywhere in the document.
    #[must_use]
    pub fn latest_timestamp(&self) -> Timestamp {
        let messages = self.messages.iter().map(Message::effective_time);
        let topics = self.topics.values().map(|t| t.set_at);
        let briefing = self.briefing.iter().map(|b| b.updated_at);
        messages
            .chain(topics)
            .chain(briefing)
            .chain(self.cursors.values().copied())
            .chain(self.last_seen.values().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed store document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for relay state backends.
///
/// The engine always reads and writes the complete document.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load the stored document, or `None` if nothing was ever saved.
    async fn load(&self) -> Result<Option<StoreData>, StorageError>;

    /// Replace the stored document.
    async fn save(&self, data: &StoreData) -> Result<(), StorageError>;
}
