//! Messages, topics and the briefing record.

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Message identifier, assigned by the log on append.
pub type MessageId = u64;

/// Leading character that marks a target as a channel.
pub const CHANNEL_SIGIL: char = '#';

/// Returns true if `target` names a channel rather than an agent.
#[must_use]
pub fn is_channel(target: &str) -> bool {
    target.starts_with(CHANNEL_SIGIL)
}

/// Kind of a logged message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain chat text.
    #[default]
    Text,
    /// IRC-style `/me` action.
    Action,
    /// Synthesized when an agent joins a channel.
    Join,
    /// Synthesized when an agent leaves a channel.
    Part,
}

/// A single entry in the message log.
///
/// The serialized field names match the on-disk document, so `ts`,
/// `modified` and `type` are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredMessage")]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub target: String,
    pub text: String,
    #[serde(rename = "ts")]
    pub sent_at: Timestamp,
    #[serde(rename = "modified", default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<Timestamp>,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

impl Message {
    /// Build a fresh, unedited message.
    #[must_use]
    pub fn new(
        id: MessageId,
        from: impl Into<String>,
        target: impl Into<String>,
        text: impl Into<String>,
        sent_at: Timestamp,
        kind: MessageKind,
    ) -> Self {
        Self {
            id,
            from: from.into(),
            target: target.into(),
            text: text.into(),
            sent_at,
            modified_at: None,
            kind,
        }
    }

    /// Time the message last changed: the edit time if edited, else the send time.
    #[must_use]
    pub fn effective_time(&self) -> Timestamp {
        self.sent_at.max(self.modified_at.unwrap_or(0))
    }

    /// Whether this message is addressed to a channel.
    #[must_use]
    pub fn is_channel_message(&self) -> bool {
        is_channel(&self.target)
    }
}

/// On-disk message shape, accepting documents written before `channel`
/// was renamed to `target` and before `type` existed.
#[derive(Deserialize)]
struct StoredMessage {
    id: MessageId,
    from: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    text: String,
    ts: Timestamp,
    #[serde(default)]
    modified: Option<Timestamp>,
    #[serde(rename = "type", default)]
    kind: MessageKind,
}

impl From<StoredMessage> for Message {
    fn from(raw: StoredMessage) -> Self {
        Self {
            id: raw.id,
            from: raw.from,
            target: raw.channel.or(raw.target).unwrap_or_default(),
            text: raw.text,
            sent_at: raw.ts,
            modified_at: raw.modified,
            kind: raw.kind,
        }
    }
}

/// Channel topic, overwritten wholesale on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub text: String,
    pub set_by: String,
    #[serde(rename = "ts")]
    pub set_at: Timestamp,
}

/// Global standing instructions delivered to every agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Briefing {
    pub text: String,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_time_prefers_later_edit() {
        let mut msg = Message::new(1, "alice", "#general", "hi", 100, MessageKind::Text);
        assert_eq!(msg.effective_time(), 100);

        msg.modified_at = Some(250);
        assert_eq!(msg.effective_time(), 250);
    }

    #[test]
    fn channel_detection() {
        assert!(is_channel("#general"));
        assert!(!is_channel("bob"));
        assert!(!is_channel(""));
    }

    #[test]
    fn legacy_channel_key_and_missing_type() {
        let json = r##"{"id":7,"from":"alice","channel":"#ops","text":"up","ts":42}"##;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.target, "#ops");
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.modified_at, None);
    }

    #[test]
    fn serializes_document_field_names() {
        let msg = Message::new(3, "bob", "alice", "ping", 9, MessageKind::Action);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["ts"], 9);
        assert_eq!(value["type"], "action");
        assert!(value.get("modified").is_none());
    }
}
