//! In-memory relay state.
//!
//! `State` holds the persisted document plus the session registry. Its
//! methods are split across the component modules (`log`, `membership`,
//! `topic`, `sync`, `identity`) and never touch storage or the clock:
//! callers pass `now` in and drain [`State::take_events`] after persisting.

use marc_core::{ChangeEvent, LiveAgent, RelayConfig, StoreData};

use crate::identity::IdentityRegistry;

pub(crate) struct State {
    pub(crate) data: StoreData,
    pub(crate) identities: IdentityRegistry,
    pub(crate) max_messages: usize,
    pub(crate) join_history: usize,
    pending: Vec<ChangeEvent>,
}

impl State {
    pub(crate) fn new(data: StoreData, config: &RelayConfig) -> Self {
        Self {
            data,
            identities: IdentityRegistry::new(),
            max_messages: config.max_messages,
            join_history: config.join_history,
            pending: Vec::new(),
        }
    }

    /// Queue an event for delivery once the current operation is persisted.
    pub(crate) fn emit(&mut self, event: ChangeEvent) {
        self.pending.push(event);
    }

    /// Queue a roster-change event carrying the current live agents.
    pub(crate) fn emit_roster(&mut self) {
        let data = self.live_agents();
        self.emit(ChangeEvent::Agents { data });
    }

    pub(crate) fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Live sessions with their last activity.
    pub(crate) fn live_agents(&self) -> Vec<LiveAgent> {
        self.identities
            .iter()
            .map(|identity| LiveAgent {
                id: identity.id.clone(),
                name: identity.name.clone(),
                ts: self.data.last_seen.get(&identity.name).copied(),
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn state() -> State {
        State::new(StoreData::default(), &RelayConfig::new("/unused"))
    }

    pub(crate) fn state_with_cap(max_messages: usize) -> State {
        State::new(
            StoreData::default(),
            &RelayConfig::new("/unused").with_max_messages(max_messages),
        )
    }
}
