//! Session identities: issue, resolve and rename.
//!
//! Sessions live only in memory. A session id is the capability a caller
//! presents instead of credentials, so it is random and never derived
//! from anything guessable.

use std::collections::{BTreeMap, HashMap};

use marc_core::{Identity, Timestamp};
use uuid::Uuid;

use crate::{outcome::RenameOutcome, state::State};

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LEN: usize = 5;

/// Random short session id drawn from `[a-z0-9]`.
fn random_id() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(ID_LEN)
        .map(|b| char::from(ID_ALPHABET[usize::from(*b) % ID_ALPHABET.len()]))
        .collect()
}

/// Display name given to a session before it picks one.
#[must_use]
pub fn default_name(session_id: &str) -> String {
    format!("anon-{session_id}")
}

/// Live sessions keyed by session id.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    sessions: HashMap<String, Identity>,
    issued: Vec<String>,
}

impl IdentityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new session with a fresh random id.
    pub fn issue(&mut self) -> Identity {
        self.issue_with(random_id)
    }

    /// Issue a new session, drawing ids from `next_id` until both the id
    /// and its default name are unused by any live session.
    pub fn issue_with(&mut self, mut next_id: impl FnMut() -> String) -> Identity {
        let id = loop {
            let candidate = next_id();
            if !self.sessions.contains_key(&candidate)
                && !self.name_taken(&default_name(&candidate), "")
            {
                break candidate;
            }
            tracing::debug!(session = %candidate, "session id collision, retrying");
        };
        let identity = Identity {
            name: default_name(&id),
            id: id.clone(),
        };
        self.sessions.insert(id.clone(), identity.clone());
        self.issued.push(id);
        identity
    }

    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<&Identity> {
        self.sessions.get(session_id)
    }

    #[must_use]
    pub fn resolve(&self, session_id: &str) -> Option<&str> {
        self.get(session_id).map(|identity| identity.name.as_str())
    }

    /// Whether a session other than `except` currently speaks as `name`.
    #[must_use]
    pub fn name_taken(&self, name: &str, except: &str) -> bool {
        self.sessions
            .values()
            .any(|identity| identity.id != except && identity.name == name)
    }

    fn set_name(&mut self, session_id: &str, name: &str) {
        if let Some(identity) = self.sessions.get_mut(session_id) {
            identity.name = name.to_string();
        }
    }

    pub fn remove(&mut self, session_id: &str) -> Option<Identity> {
        let removed = self.sessions.remove(session_id);
        if removed.is_some() {
            self.issued.retain(|id| id != session_id);
        }
        removed
    }

    /// Drop every session using `name`. Returns how many were removed.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let ids: Vec<String> = self
            .sessions
            .values()
            .filter(|identity| identity.name == name)
            .map(|identity| identity.id.clone())
            .collect();
        for id in &ids {
            self.remove(id);
        }
        ids.len()
    }

    /// Sessions in the order they were issued.
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.issued.iter().filter_map(|id| self.sessions.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Move `old`'s entry to `new`. If `old` had none, `new` ends up with none.
fn migrate<V>(map: &mut BTreeMap<String, V>, old: &str, new: &str) {
    match map.remove(old) {
        Some(value) => {
            map.insert(new.to_string(), value);
        }
        None => {
            map.remove(new);
        }
    }
}

impl State {
    pub(crate) fn issue_identity(&mut self, now: Timestamp) -> Identity {
        let identity = self.identities.issue();
        self.data.last_seen.insert(identity.name.clone(), now);
        tracing::info!(session = %identity.id, "identity issued");
        self.emit_roster();
        identity
    }

    /// Rename a session, carrying its cursor, membership and presence along.
    pub(crate) fn rename(&mut self, session_id: &str, new_name: &str) -> RenameOutcome {
        let Some(old_name) = self.identities.resolve(session_id).map(str::to_string) else {
            return RenameOutcome::rejected(
                "",
                format!("Unknown session \"{session_id}\". Request an identity first."),
            );
        };

        if self.identities.name_taken(new_name, session_id) {
            return RenameOutcome::rejected(
                old_name,
                format!("Name \"{new_name}\" is already taken."),
            );
        }
        if old_name == new_name {
            return RenameOutcome::renamed(new_name);
        }

        migrate(&mut self.data.cursors, &old_name, new_name);
        migrate(&mut self.data.joined, &old_name, new_name);
        migrate(&mut self.data.last_seen, &old_name, new_name);
        self.identities.set_name(session_id, new_name);

        tracing::info!(session = session_id, from = %old_name, to = new_name, "identity renamed");
        self.emit_roster();
        RenameOutcome::renamed(new_name)
    }

    pub(crate) fn remove_identity(&mut self, session_id: &str) -> bool {
        let removed = self.identities.remove(session_id).is_some();
        if removed {
            self.emit_roster();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::state;

    #[test]
    fn random_ids_use_the_alphabet() {
        let id = random_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn colliding_ids_are_retried() {
        let mut registry = IdentityRegistry::new();
        let first = registry.issue_with(|| "aaaaa".to_string());

        let mut candidates = vec!["bbbbb", "aaaaa"];
        let second = registry.issue_with(|| candidates.pop().unwrap().to_string());

        assert_eq!(first.id, "aaaaa");
        assert_eq!(second.id, "bbbbb");
        assert_eq!(second.name, "anon-bbbbb");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn default_name_never_shadows_a_renamed_session() {
        let mut state = state();
        let first = state.identities.issue_with(|| "aaaaa".to_string());
        assert!(state.rename(&first.id, "anon-bbbbb").ok);

        let mut candidates = vec!["ccccc", "bbbbb"];
        let second = state
            .identities
            .issue_with(|| candidates.pop().unwrap().to_string());

        assert_eq!(second.id, "ccccc");
        let names: Vec<_> = state.identities.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["anon-bbbbb", "anon-ccccc"]);
    }

    #[test]
    fn rename_rejects_names_held_by_other_sessions() {
        let mut state = state();
        let a = state.issue_identity(1);
        let b = state.issue_identity(2);

        assert!(state.rename(&a.id, "alice").ok);
        let outcome = state.rename(&b.id, "alice");
        assert!(!outcome.ok);
        assert_eq!(outcome.name, b.name);
        assert!(outcome.error.unwrap().contains("already taken"));

        assert!(state.rename(&a.id, "alice").ok);
        assert!(!state.rename("nobody", "x").ok);
    }

    #[test]
    fn rename_carries_tracking_state() {
        let mut state = state();
        let session = state.issue_identity(1);
        let old = session.name.clone();
        state.join(&old, "#x", 2);
        state.data.cursors.insert(old.clone(), 2);
        state.data.cursors.insert("bob".into(), 77);

        assert!(state.rename(&session.id, "bob").ok);

        assert_eq!(state.data.cursors.get("bob"), Some(&2));
        assert_eq!(state.data.joined["bob"], vec!["#x".to_string()]);
        assert_eq!(state.data.last_seen.get("bob"), Some(&1));
        assert!(!state.data.cursors.contains_key(&old));
        assert!(!state.data.joined.contains_key(&old));
        assert!(!state.data.last_seen.contains_key(&old));
        assert_eq!(state.identities.resolve(&session.id), Some("bob"));
    }

    #[test]
    fn roster_preserves_issue_order() {
        let mut state = state();
        let ids: Vec<_> = (0..4).map(|i| state.issue_identity(i).id).collect();
        state.remove_identity(&ids[1]);

        let live: Vec<_> = state.live_agents().into_iter().map(|a| a.id).collect();
        assert_eq!(live, vec![ids[0].clone(), ids[2].clone(), ids[3].clone()]);
    }
}
