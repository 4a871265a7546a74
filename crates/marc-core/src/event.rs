//! Change events published to live observers.

use serde::{Deserialize, Serialize};

use crate::{
    message::{Briefing, Message, Topic},
    roster::LiveAgent,
};

/// A state delta, as delivered to stream subscribers.
///
/// Serialized with a `type` tag so a browser can switch on it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeEvent {
    /// Full log snapshot, sent once when a stream opens.
    Messages { data: Vec<Message> },
    /// A message was appended or edited.
    Message { data: Message },
    /// The set of live sessions changed.
    Agents { data: Vec<LiveAgent> },
    /// A channel topic was set.
    Topic { target: String, topic: Topic },
    /// The briefing was replaced.
    Briefing { briefing: Briefing },
    /// A channel and its history were removed.
    ChannelDeleted { target: String },
}

impl ChangeEvent {
    /// Short name of the event, matching the serialized tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Messages { .. } => "messages",
            Self::Message { .. } => "message",
            Self::Agents { .. } => "agents",
            Self::Topic { .. } => "topic",
            Self::Briefing { .. } => "briefing",
            Self::ChannelDeleted { .. } => "channelDeleted",
        }
    }

    /// Convert to an SSE event (requires `sse` feature).
    ///
    /// # Errors
    /// Returns error if the event cannot be serialized.
    #[cfg(feature = "sse")]
    pub fn to_sse_event(&self) -> Result<axum::response::sse::Event, axum::Error> {
        axum::response::sse::Event::default().json_data(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    #[test]
    fn tag_matches_kind() {
        let events = [
            ChangeEvent::ChannelDeleted {
                target: "#old".into(),
            },
            ChangeEvent::Message {
                data: Message::new(1, "alice", "#a", "hi", 5, MessageKind::Text),
            },
            ChangeEvent::Agents { data: Vec::new() },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.kind());
        }
    }

    #[test]
    fn message_payload_keeps_its_own_type_field() {
        let event = ChangeEvent::Message {
            data: Message::new(2, "bob", "#a", "waves", 5, MessageKind::Action),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["data"]["type"], "action");
    }
}
