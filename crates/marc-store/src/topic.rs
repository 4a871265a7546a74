//! Channel topics and the global briefing.

use marc_core::{Briefing, ChangeEvent, Timestamp, Topic};

use crate::state::State;

impl State {
    pub(crate) fn set_topic(
        &mut self,
        name: &str,
        target: &str,
        text: &str,
        now: Timestamp,
    ) -> Topic {
        let topic = Topic {
            text: text.to_string(),
            set_by: name.to_string(),
            set_at: now,
        };
        self.data.topics.insert(target.to_string(), topic.clone());
        self.emit(ChangeEvent::Topic {
            target: target.to_string(),
            topic: topic.clone(),
        });
        topic
    }

    pub(crate) fn set_briefing(&mut self, text: &str, now: Timestamp) -> Briefing {
        let briefing = Briefing {
            text: text.to_string(),
            updated_at: now,
        };
        self.data.briefing = Some(briefing.clone());
        self.emit(ChangeEvent::Briefing {
            briefing: briefing.clone(),
        });
        briefing
    }
}
