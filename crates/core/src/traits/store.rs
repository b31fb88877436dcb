//! Session context store contract

use crate::session::Session;

/// Process-wide mapping from call id to per-call session state.
///
/// There is no failure path by design: a missing session degrades to a
/// freshly-initialized one rather than erroring, because losing session
/// state must never crash an in-progress phone call. The cost is a
/// possible dialogue restart under store eviction.
///
/// Implementations must be independently safe per key; no global lock may
/// be held across a whole turn. Callers publish a fully-computed session
/// with `update`, so a concurrent `get` for the same call observes either
/// the previous turn's state or the new one — never a partially-merged
/// slot set paired with a stale stage.
pub trait SessionStore: Send + Sync {
    /// Fetch the session for a call, creating it with defaults if absent.
    fn get(&self, call_id: &str) -> Session;

    /// Publish the next state for a call. The caller hands over a fully
    /// computed session: slot merges for the turn (key-wise union, never
    /// clearing a filled slot with an empty extraction) happen before the
    /// publish, so stage and slots always land together.
    fn update(&self, call_id: &str, session: Session);

    /// Tear down a call's session. Idempotent: deleting an absent session
    /// is a no-op, not an error.
    fn delete(&self, call_id: &str);
}
