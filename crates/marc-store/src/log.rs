//! Message log: append, eviction, errata and read-side queries.

use std::collections::HashSet;

use marc_core::{ChangeEvent, Message, MessageId, MessageKind, Timestamp};

use crate::state::State;

/// Default number of results returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Default window on each side of a message for `context`.
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

/// Filters for a log search. Empty strings count as "no filter".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Case-insensitive substring of the text.
    pub query: Option<String>,
    /// Exact target.
    pub target: Option<String>,
    /// Exact sender.
    pub sender: Option<String>,
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: None,
            target: None,
            sender: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchQuery {
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn from_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn matches(&self, message: &Message, needle: Option<&str>) -> bool {
        if let Some(target) = non_empty(self.target.as_deref()) {
            if message.target != target {
                return false;
            }
        }
        if let Some(sender) = non_empty(self.sender.as_deref()) {
            if message.from != sender {
                return false;
            }
        }
        needle.is_none_or(|needle| message.text.to_lowercase().contains(needle))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl State {
    /// Append a message, evict past the cap and queue a notification.
    pub(crate) fn append(
        &mut self,
        from: &str,
        target: &str,
        text: &str,
        kind: MessageKind,
        now: Timestamp,
    ) -> MessageId {
        let id = self.data.next_id;
        self.data.next_id += 1;

        let message = Message::new(id, from, target, text, now, kind);
        self.data.messages.push(message.clone());
        self.evict();

        tracing::debug!(id, from, to = target, ?kind, "message appended");
        self.emit(ChangeEvent::Message { data: message });
        id
    }

    /// Drop the oldest messages until the log fits its cap.
    fn evict(&mut self) {
        let len = self.data.messages.len();
        if len > self.max_messages {
            let excess = len - self.max_messages;
            self.data.messages.drain(..excess);
            tracing::debug!(evicted = excess, "message log trimmed");
        }
    }

    /// Replace a message's text. Returns false if no such message exists.
    pub(crate) fn errata(&mut self, id: MessageId, text: &str, now: Timestamp) -> bool {
        let Some(message) = self.data.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.text = text.to_string();
        message.modified_at = Some(now);

        let data = message.clone();
        self.emit(ChangeEvent::Message { data });
        true
    }

    pub(crate) fn messages_for_target(&self, target: &str) -> Vec<Message> {
        self.data
            .messages
            .iter()
            .filter(|m| m.target == target)
            .cloned()
            .collect()
    }

    /// Slice of the physical log around `id`, regardless of target.
    pub(crate) fn context(&self, id: MessageId, before: usize, after: usize) -> Vec<Message> {
        let messages = &self.data.messages;
        let Some(idx) = messages.iter().position(|m| m.id == id) else {
            return Vec::new();
        };
        let start = idx.saturating_sub(before);
        let end = messages.len().min(idx.saturating_add(after).saturating_add(1));
        messages[start..end].to_vec()
    }

    /// Newest-first scan, stopping at `query.limit` hits.
    pub(crate) fn search(&self, query: &SearchQuery) -> Vec<Message> {
        let needle = non_empty(query.query.as_deref()).map(str::to_lowercase);
        self.data
            .messages
            .iter()
            .rev()
            .filter(|m| query.matches(m, needle.as_deref()))
            .take(query.limit)
            .cloned()
            .collect()
    }

    pub(crate) fn remove_messages(&mut self, ids: &HashSet<MessageId>) {
        if !ids.is_empty() {
            self.data.messages.retain(|m| !ids.contains(&m.id));
        }
    }
}
