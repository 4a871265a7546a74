//! Channel membership: join, part, member listings and channel deletion.

use std::collections::BTreeSet;

use marc_core::{ChangeEvent, ChannelSummary, MessageKind, PresenceEntry, Timestamp};

use crate::{outcome::JoinOutcome, state::State};

impl State {
    pub(crate) fn is_member(&self, name: &str, target: &str) -> bool {
        self.data
            .joined
            .get(name)
            .is_some_and(|channels| channels.iter().any(|c| c == target))
    }

    /// Join `target`, posting a join notice the first time only.
    pub(crate) fn join(&mut self, name: &str, target: &str, now: Timestamp) -> JoinOutcome {
        if !self.is_member(name, target) {
            self.data
                .joined
                .entry(name.to_string())
                .or_default()
                .push(target.to_string());
            self.append(name, target, &format!("joined {target}"), MessageKind::Join, now);
        }

        let history = self.messages_for_target(target);
        let skip = history.len().saturating_sub(self.join_history);
        JoinOutcome {
            history: history.into_iter().skip(skip).collect(),
            topic: self.data.topics.get(target).cloned(),
        }
    }

    /// Leave `target`. Returns false (and posts nothing) if not a member.
    pub(crate) fn part(&mut self, name: &str, target: &str, now: Timestamp) -> bool {
        let Some(channels) = self.data.joined.get_mut(name) else {
            return false;
        };
        let Some(idx) = channels.iter().position(|c| c == target) else {
            return false;
        };
        channels.remove(idx);
        self.append(name, target, &format!("left {target}"), MessageKind::Part, now);
        true
    }

    /// Every agent whose membership includes `target`.
    pub(crate) fn users(&self, target: &str) -> Vec<PresenceEntry> {
        self.data
            .joined
            .iter()
            .filter(|(_, channels)| channels.iter().any(|c| c == target))
            .map(|(name, _)| PresenceEntry {
                name: name.clone(),
                ts: self.data.last_seen.get(name).copied(),
            })
            .collect()
    }

    fn member_count(&self, target: &str) -> usize {
        self.data
            .joined
            .values()
            .filter(|channels| channels.iter().any(|c| c == target))
            .count()
    }

    /// Channels that appear in the log, sorted by name.
    pub(crate) fn channels(&self) -> Vec<ChannelSummary> {
        let names: BTreeSet<&str> = self
            .data
            .messages
            .iter()
            .filter(|m| m.is_channel_message())
            .map(|m| m.target.as_str())
            .collect();

        names
            .into_iter()
            .map(|name| ChannelSummary {
                name: name.to_string(),
                topic: self.data.topics.get(name).map(|t| t.text.clone()),
                member_count: self.member_count(name),
            })
            .collect()
    }

    /// Remove a channel's messages, memberships and topic.
    pub(crate) fn delete_channel(&mut self, target: &str) {
        self.data.messages.retain(|m| m.target != target);
        for channels in self.data.joined.values_mut() {
            channels.retain(|c| c != target);
        }
        self.data.topics.remove(target);
        self.emit(ChangeEvent::ChannelDeleted {
            target: target.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use marc_core::MessageKind;

    use crate::state::test_support::state;

    #[test]
    fn join_is_idempotent() {
        let mut state = state();
        state.join("alice", "#x", 1);
        state.join("alice", "#x", 2);

        let notices = state
            .data
            .messages
            .iter()
            .filter(|m| m.kind == MessageKind::Join)
            .count();
        assert_eq!(notices, 1);
        assert_eq!(state.data.joined["alice"], vec!["#x".to_string()]);
    }

    #[test]
    fn join_returns_bounded_history_and_topic() {
        let mut state = state();
        state.join_history = 3;
        for i in 0..5 {
            state.append("bob", "#x", &format!("m{i}"), MessageKind::Text, i);
        }
        state.append("bob", "#y", "elsewhere", MessageKind::Text, 6);

        let outcome = state.join("alice", "#x", 7);
        let texts: Vec<_> = outcome.history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m3", "m4", "joined #x"]);
        assert!(outcome.topic.is_none());
    }

    #[test]
    fn part_only_posts_for_members() {
        let mut state = state();
        assert!(!state.part("alice", "#x", 1));
        assert!(state.data.messages.is_empty());

        state.join("alice", "#x", 2);
        assert!(state.part("alice", "#x", 3));
        assert!(!state.part("alice", "#x", 4));

        let last = state.data.messages.last().unwrap();
        assert_eq!(last.kind, MessageKind::Part);
        assert_eq!(last.text, "left #x");
        assert!(state.data.joined["alice"].is_empty());
    }

    #[test]
    fn users_and_channel_listing() {
        let mut state = state();
        state.join("alice", "#b", 1);
        state.join("bob", "#b", 2);
        state.join("bob", "#a", 3);
        state.append("alice", "carol", "dm", MessageKind::Text, 4);
        state.data.last_seen.insert("bob".into(), 9);

        let users = state.users("#b");
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "bob");
        assert_eq!(users[1].ts, Some(9));
        assert_eq!(users[0].ts, None);

        let channels = state.channels();
        let names: Vec<_> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["#a", "#b"]);
        assert_eq!(channels[1].member_count, 2);
    }

    #[test]
    fn delete_channel_removes_all_traces() {
        let mut state = state();
        state.join("alice", "#gone", 1);
        state.join("alice", "#kept", 2);
        state.take_events();

        state.delete_channel("#gone");

        assert!(state.data.messages.iter().all(|m| m.target != "#gone"));
        assert_eq!(state.data.joined["alice"], vec!["#kept".to_string()]);
        assert_eq!(state.take_events().len(), 1);
    }
}
