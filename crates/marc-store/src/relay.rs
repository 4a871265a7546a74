//! The relay engine: one object owning all relay state.

use std::sync::Arc;

use futures::stream::BoxStream;
use marc_core::{
    Briefing, ChangeEvent, ChannelSummary, Clock, Identity, LiveAgent, Message, MessageId,
    MessageKind, Notifier, PresenceEntry, RelayConfig, StoreData, Subscription, SystemClock,
    Topic,
    traits::StateStorage,
};
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::{
    log::SearchQuery,
    outcome::{JoinOutcome, RenameOutcome, SyncBatch, Welcome},
    state::State,
};

/// Message relay engine.
///
/// Every mutating operation takes the write lock, applies its change,
/// persists the whole document and only then notifies subscribers and
/// returns. Read-only operations share the read lock.
///
/// A failed write is logged and the relay keeps serving from memory; the
/// next successful write brings the document back up to date.
pub struct Relay<S>
where
    S: StateStorage,
{
    config: RelayConfig,
    storage: S,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    state: RwLock<State>,
}

impl<S> Relay<S>
where
    S: StateStorage,
{
    /// Load state from `storage` and start a relay on the system clock.
    pub async fn open(config: RelayConfig, storage: S) -> Self {
        Self::open_with_clock(config, storage, Arc::new(SystemClock::new())).await
    }

    /// Load state from `storage` and start a relay on `clock`.
    ///
    /// A missing document starts empty. An unreadable or malformed one is
    /// logged and also starts empty; its contents are lost on the next save.
    pub async fn open_with_clock(config: RelayConfig, storage: S, clock: Arc<dyn Clock>) -> Self {
        let mut data = match storage.load().await {
            Ok(Some(data)) => {
                tracing::info!(messages = data.messages.len(), "relay state loaded");
                data
            }
            Ok(None) => StoreData::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load relay state, starting fresh");
                StoreData::default()
            }
        };
        data.normalize();
        clock.observe(data.latest_timestamp());

        let notifier = Notifier::new(config.subscriber_buffer);
        let state = RwLock::new(State::new(data, &config));
        Self {
            config,
            storage,
            clock,
            notifier,
            state,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RelayConfig {
        &self.config
    }

    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist the document and flush queued events, still under the write lock.
    async fn commit(&self, mut state: RwLockWriteGuard<'_, State>) {
        if let Err(e) = self.storage.save(&state.data).await {
            tracing::error!(error = %e, "failed to persist relay state, continuing in memory");
        }
        for event in state.take_events() {
            self.notifier.publish(&event);
        }
    }

    // --- Message log ---

    /// Append a message and return its id. Evicts the oldest messages past the cap.
    pub async fn post(&self, from: &str, target: &str, text: &str, kind: MessageKind) -> MessageId {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        let id = state.append(from, target, text, kind, now);
        state.data.last_seen.insert(from.to_string(), now);
        self.commit(state).await;
        id
    }

    /// Edit a message in place. Returns false if the id is unknown.
    pub async fn errata(&self, id: MessageId, text: &str) -> bool {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        if !state.errata(id, text, now) {
            return false;
        }
        self.commit(state).await;
        true
    }

    pub async fn all_messages(&self) -> Vec<Message> {
        self.state.read().await.data.messages.clone()
    }

    pub async fn messages_for_target(&self, target: &str) -> Vec<Message> {
        self.state.read().await.messages_for_target(target)
    }

    /// Up to `before` and `after` log neighbours of message `id`, or empty if unknown.
    pub async fn context(&self, id: MessageId, before: usize, after: usize) -> Vec<Message> {
        self.state.read().await.context(id, before, after)
    }

    pub async fn search(&self, query: &SearchQuery) -> Vec<Message> {
        self.state.read().await.search(query)
    }

    // --- Sync ---

    /// Everything new for `name` since its last sync; advances its cursor.
    pub async fn sync(&self, name: &str) -> SyncBatch {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        let batch = state.sync(name, now);
        self.commit(state).await;
        batch
    }

    // --- Membership & topics ---

    pub async fn join(&self, name: &str, target: &str) -> JoinOutcome {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        let outcome = state.join(name, target, now);
        self.commit(state).await;
        outcome
    }

    /// Leave a channel. Returns false if `name` was not a member.
    pub async fn part(&self, name: &str, target: &str) -> bool {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        if !state.part(name, target, now) {
            return false;
        }
        self.commit(state).await;
        true
    }

    pub async fn set_topic(&self, name: &str, target: &str, text: &str) -> Topic {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        let topic = state.set_topic(name, target, text, now);
        self.commit(state).await;
        topic
    }

    pub async fn get_topic(&self, target: &str) -> Option<Topic> {
        self.state.read().await.data.topics.get(target).cloned()
    }

    pub async fn set_briefing(&self, text: &str) -> Briefing {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        let briefing = state.set_briefing(text, now);
        self.commit(state).await;
        briefing
    }

    pub async fn get_briefing(&self) -> Option<Briefing> {
        self.state.read().await.data.briefing.clone()
    }

    pub async fn get_users(&self, target: &str) -> Vec<PresenceEntry> {
        self.state.read().await.users(target)
    }

    pub async fn get_all_channels(&self) -> Vec<ChannelSummary> {
        self.state.read().await.channels()
    }

    /// Remove a channel's history, memberships and topic.
    pub async fn delete_channel(&self, target: &str) {
        let mut state = self.state.write().await;
        state.delete_channel(target);
        tracing::info!(channel = target, "channel deleted");
        self.commit(state).await;
    }

    // --- Agents ---

    /// Remove an agent from every channel and forget it.
    pub async fn dismiss(&self, name: &str) {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        state.dismiss(name, now);
        self.commit(state).await;
    }

    /// Every name with a presence record.
    pub async fn all_agents(&self) -> Vec<PresenceEntry> {
        self.state
            .read()
            .await
            .data
            .last_seen
            .iter()
            .map(|(name, ts)| PresenceEntry {
                name: name.clone(),
                ts: Some(*ts),
            })
            .collect()
    }

    /// Live sessions with their last activity.
    pub async fn live_agents(&self) -> Vec<LiveAgent> {
        self.state.read().await.live_agents()
    }

    /// Whether `name` was active within the configured presence window.
    pub async fn is_online(&self, name: &str) -> bool {
        let ts = self.state.read().await.data.last_seen.get(name).copied();
        let entry = PresenceEntry {
            name: name.to_string(),
            ts,
        };
        entry.is_online(self.clock.now(), self.config.presence_window_ms)
    }

    // --- Identity ---

    /// Start a new session and hand back its id with the current briefing.
    pub async fn issue_identity(&self) -> Welcome {
        let mut state = self.state.write().await;
        let now = self.clock.now();
        let identity = state.issue_identity(now);
        let briefing = state.data.briefing.clone();
        self.commit(state).await;
        Welcome {
            agent_id: identity.id,
            briefing,
        }
    }

    pub async fn resolve(&self, session_id: &str) -> Option<String> {
        self.state
            .read()
            .await
            .identities
            .resolve(session_id)
            .map(str::to_string)
    }

    pub async fn identity(&self, session_id: &str) -> Option<Identity> {
        self.state.read().await.identities.get(session_id).cloned()
    }

    pub async fn rename(&self, session_id: &str, new_name: &str) -> RenameOutcome {
        let mut state = self.state.write().await;
        let outcome = state.rename(session_id, new_name);
        if outcome.ok {
            self.commit(state).await;
        }
        outcome
    }

    /// Forget a live session without touching its tracking state.
    pub async fn remove_identity(&self, session_id: &str) -> bool {
        let mut state = self.state.write().await;
        if !state.remove_identity(session_id) {
            return false;
        }
        self.commit(state).await;
        true
    }

    // --- Streaming ---

    /// Register an observer for future changes.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    /// Current log and roster, as sent to a stream when it opens.
    pub async fn snapshot(&self) -> Vec<ChangeEvent> {
        let state = self.state.read().await;
        snapshot_events(&state)
    }

    /// Snapshot followed by live changes, with nothing missed in between.
    pub async fn stream(&self) -> BoxStream<'static, ChangeEvent> {
        let (subscription, initial) = self.open_stream().await;
        subscription.with_snapshot(initial)
    }

    /// Subscribe and snapshot atomically.
    ///
    /// Events are published while the write lock is held, so taking the read
    /// lock here means no change can fall between the snapshot and the feed.
    pub async fn open_stream(&self) -> (Subscription, Vec<ChangeEvent>) {
        let state = self.state.read().await;
        let subscription = self.notifier.subscribe();
        (subscription, snapshot_events(&state))
    }
}

fn snapshot_events(state: &State) -> Vec<ChangeEvent> {
    vec![
        ChangeEvent::Messages {
            data: state.data.messages.clone(),
        },
        ChangeEvent::Agents {
            data: state.live_agents(),
        },
    ]
}
