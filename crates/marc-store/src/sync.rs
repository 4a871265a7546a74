//! Per-agent sync cursors and the dismiss cascade.
//!
//! A cursor is a content timestamp, not a wall-clock read: after a sync it
//! sits at the latest stamp the agent has actually been handed. Anything
//! stamped later (a new message, an edit, a topic or briefing change) is
//! news on the next sync. Direct messages are delivered once and then
//! removed from the log.

use std::collections::{BTreeMap, HashSet};

use marc_core::{MessageKind, Timestamp};

use crate::{outcome::SyncBatch, state::State};

/// Prefix of the notice returned to senders of undeliverable messages.
pub const UNDELIVERABLE_PREFIX: &str = "The message couldn't be delivered: ";

impl State {
    pub(crate) fn cursor(&self, name: &str) -> Timestamp {
        self.data.cursors.get(name).copied().unwrap_or(0)
    }

    /// Collect everything new for `name` and advance its cursor.
    pub(crate) fn sync(&mut self, name: &str, now: Timestamp) -> SyncBatch {
        let cursor = self.cursor(name);
        let joined: HashSet<&str> = self
            .data
            .joined
            .get(name)
            .map(|channels| channels.iter().map(String::as_str).collect())
            .unwrap_or_default();

        let messages: Vec<_> = self
            .data
            .messages
            .iter()
            .filter(|m| m.effective_time() > cursor)
            .filter(|m| m.target == name || joined.contains(m.target.as_str()))
            .cloned()
            .collect();

        let topics: BTreeMap<_, _> = joined
            .iter()
            .filter_map(|channel| {
                self.data
                    .topics
                    .get(*channel)
                    .filter(|topic| topic.set_at > cursor)
                    .map(|topic| ((*channel).to_string(), topic.clone()))
            })
            .collect();

        let briefing = self
            .data
            .briefing
            .as_ref()
            .filter(|b| b.updated_at > cursor)
            .cloned();

        let max_time = messages
            .iter()
            .map(marc_core::Message::effective_time)
            .chain(topics.values().map(|t| t.set_at))
            .chain(briefing.iter().map(|b| b.updated_at))
            .max()
            .unwrap_or(0);

        if max_time > cursor {
            self.data.cursors.insert(name.to_string(), max_time);

            let delivered: HashSet<_> = messages
                .iter()
                .filter(|m| m.target == name)
                .map(|m| m.id)
                .collect();
            self.remove_messages(&delivered);
        }

        self.data.last_seen.insert(name.to_string(), now);

        tracing::debug!(
            agent = name,
            cursor,
            messages = messages.len(),
            topics = topics.len(),
            briefing = briefing.is_some(),
            "sync"
        );

        SyncBatch {
            messages,
            topics,
            briefing,
        }
    }

    /// Remove an agent entirely.
    ///
    /// Parts every joined channel one by one, bounces unread direct messages
    /// back to their senders, forgets all per-agent tracking and drops any
    /// live session using the name.
    pub(crate) fn dismiss(&mut self, name: &str, now: Timestamp) {
        let channels = self.data.joined.get(name).cloned().unwrap_or_default();
        for channel in &channels {
            self.part(name, channel, now);
        }

        let unread: Vec<_> = self
            .data
            .messages
            .iter()
            .filter(|m| m.target == name)
            .map(|m| (m.id, m.from.clone(), m.text.clone()))
            .collect();

        for (_, from, text) in &unread {
            if from != name {
                let notice = format!("{UNDELIVERABLE_PREFIX}{text}");
                self.append(name, from, &notice, MessageKind::Text, now);
            }
        }
        let ids: HashSet<_> = unread.iter().map(|(id, _, _)| *id).collect();
        self.remove_messages(&ids);

        self.data.joined.remove(name);
        self.data.last_seen.remove(name);
        self.data.cursors.remove(name);

        let sessions = self.identities.remove_by_name(name);
        tracing::info!(
            agent = name,
            parted = channels.len(),
            bounced = unread.len(),
            sessions,
            "agent dismissed"
        );
        self.emit_roster();
    }
}
