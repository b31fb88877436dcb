//! Session context store
//!
//! In-memory keyed store for per-call session state. Lifecycle follows
//! the call: created lazily on first read, mutated every turn, torn down
//! when the call ends. No persistence across calls; a repeat caller gets
//! a fresh session.

use parking_lot::RwLock;
use std::collections::HashMap;

use clinic_agent_core::{Session, SessionStore};

/// Default session store: a `HashMap` behind a `parking_lot::RwLock`.
///
/// Locks are held only for the map operation itself, never across a
/// turn's processing; the engine computes the whole next session before
/// publishing, so readers see either the previous or the next state.
///
/// A blank call id yields a detached default session and makes `update`
/// and `delete` no-ops, so a provider callback missing its call id
/// degrades instead of crashing the call.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live session count, for capacity metrics
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, call_id: &str) -> Session {
        let call_id = call_id.trim();
        if call_id.is_empty() {
            return Session::default();
        }

        if let Some(session) = self.sessions.read().get(call_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write();
        // Double-checked under the write lock: another turn for a
        // different delivery of the same call may have won the race.
        sessions
            .entry(call_id.to_string())
            .or_insert_with(|| {
                tracing::info!(call_id = %call_id, "created session");
                Session::new(call_id)
            })
            .clone()
    }

    fn update(&self, call_id: &str, session: Session) {
        let call_id = call_id.trim();
        if call_id.is_empty() {
            return;
        }
        self.sessions.write().insert(call_id.to_string(), session);
    }

    fn delete(&self, call_id: &str) {
        let call_id = call_id.trim();
        if call_id.is_empty() {
            return;
        }
        if self.sessions.write().remove(call_id).is_some() {
            tracing::info!(call_id = %call_id, "session torn down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_agent_core::{SlotKey, Stage, TaskType};

    #[test]
    fn test_get_creates_with_defaults() {
        let store = InMemorySessionStore::new();
        let session = store.get("CA1");
        assert_eq!(session.stage, Stage::Greeting);
        assert!(session.slots.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_then_get_round_trip() {
        let store = InMemorySessionStore::new();
        let mut session = store.get("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "Rahul");
        store.update("CA1", session);

        let fetched = store.get("CA1");
        assert_eq!(fetched.task_type, Some(TaskType::Appointment));
        assert_eq!(fetched.slots.get(SlotKey::Name), Some("Rahul"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = InMemorySessionStore::new();
        store.get("CA1");
        store.delete("CA1");
        store.delete("CA1");
        store.delete("never-existed");
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_then_get_restarts_fresh() {
        let store = InMemorySessionStore::new();
        let mut session = store.get("CA1");
        session.stage = Stage::PostTask;
        store.update("CA1", session);
        store.delete("CA1");

        let fresh = store.get("CA1");
        assert_eq!(fresh.stage, Stage::Greeting);
    }

    #[test]
    fn test_blank_call_id_is_detached() {
        let store = InMemorySessionStore::new();
        let session = store.get("  ");
        assert_eq!(session.stage, Stage::Greeting);

        store.update("", session);
        store.delete("");
        assert!(store.is_empty());
    }

    #[test]
    fn test_sessions_isolated_by_call_id() {
        let store = InMemorySessionStore::new();
        let mut a = store.get("CA-a");
        a.slots.set(SlotKey::Name, "Rahul");
        store.update("CA-a", a);

        let b = store.get("CA-b");
        assert!(b.slots.is_empty());
    }
}
