//! Per-call session state
//!
//! One `Session` exists per live call, keyed by the provider's call id.
//! Slot values grow monotonically toward completeness while the task type
//! stays fixed; changing the task type resets them. Counters are reset by
//! whichever transition resolves the condition they track.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stage::{SlotKey, Stage, TaskType};

/// Slot memory for the active flow.
///
/// A thin wrapper over a name→value map so merge semantics live in one
/// place: a filled slot is never overwritten by an extracted empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots(BTreeMap<SlotKey, String>);

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: SlotKey) -> Option<&str> {
        self.0.get(&key).map(|v| v.as_str())
    }

    pub fn is_filled(&self, key: SlotKey) -> bool {
        self.get(key).is_some_and(|v| !v.trim().is_empty())
    }

    /// Set a slot value. Empty values are ignored, never stored.
    pub fn set(&mut self, key: SlotKey, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.0.insert(key, value);
        }
    }

    /// Explicit correction: replace a slot value even if already filled.
    pub fn correct(&mut self, key: SlotKey, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    /// Key-wise union merge. Already-filled slots are kept; extracted
    /// empty values never clear anything.
    pub fn merge(&mut self, extracted: &BTreeMap<SlotKey, String>) {
        for (key, value) in extracted {
            if !self.is_filled(*key) {
                self.set(*key, value.clone());
            }
        }
    }

    /// First unfilled slot for the task type, in its fixed priority order
    pub fn first_missing(&self, task_type: TaskType) -> Option<SlotKey> {
        task_type
            .required_slots()
            .iter()
            .copied()
            .find(|key| !self.is_filled(*key))
    }

    pub fn is_complete(&self, task_type: TaskType) -> bool {
        self.first_missing(task_type).is_none()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Mutable per-call state tracked turn-over-turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque call identifier from the telephony provider
    pub call_id: String,
    /// Current dialogue position
    pub stage: Stage,
    /// Active slot-filling flow, if any
    pub task_type: Option<TaskType>,
    /// Collected slot values for the active flow
    pub slots: Slots,

    /// Total turns handled for this call
    pub turn_count: u32,
    /// Consecutive turns where phrasing degraded to the fixed fallback
    pub failed_turns: u32,
    /// Consecutive turns where the phrasing call errored outright
    pub ai_failures: u32,
    /// Consecutive turns classified as unrecognized intent
    pub other_intent_turns: u32,
    /// Consecutive empty (no-speech) turns
    pub no_speech_count: u32,

    /// Set true exactly once when slots complete and the task is created
    pub task_created: bool,
    /// Post-completion gate: dialogue switched to informational behavior
    pub appointment_confirmed: bool,
    /// Hand-off latch: an emergency or human-request escalation fired and
    /// normal dialogue must not resume for the rest of the call
    pub escalated: bool,

    // Transport-adaptation fields, consumed by the boundary only.
    pub last_user_text: String,
    pub last_bot_text: String,
    pub bot_repeat_count: u32,
}

impl Session {
    /// Fresh session for a call: GREETING stage, no flow, empty slots.
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            stage: Stage::Greeting,
            task_type: None,
            slots: Slots::new(),
            turn_count: 0,
            failed_turns: 0,
            ai_failures: 0,
            other_intent_turns: 0,
            no_speech_count: 0,
            task_created: false,
            appointment_confirmed: false,
            escalated: false,
            last_user_text: String::new(),
            last_bot_text: String::new(),
            bot_repeat_count: 0,
        }
    }

    /// Switch the active task type, resetting slot memory and the
    /// completion latches. A `None`-to-`Some` switch on a fresh session
    /// also goes through here so the reset rule lives in one place.
    pub fn start_flow(&mut self, task_type: TaskType) {
        if self.task_type != Some(task_type) || self.task_created {
            self.slots.clear();
        }
        self.task_type = Some(task_type);
        self.task_created = false;
        self.appointment_confirmed = false;
    }

    /// Mark the task created. Returns true only on the false→true flip so
    /// the caller fires the task sink at most once per flow.
    pub fn mark_task_created(&mut self) -> bool {
        if self.task_created {
            return false;
        }
        self.task_created = true;
        self.appointment_confirmed = true;
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Flow;

    #[test]
    fn test_fresh_session_defaults() {
        let session = Session::new("CA123");
        assert_eq!(session.stage, Stage::Greeting);
        assert!(session.task_type.is_none());
        assert!(session.slots.is_empty());
        assert!(!session.task_created);
        assert_eq!(session.turn_count, 0);
    }

    #[test]
    fn test_slots_never_cleared_by_empty_value() {
        let mut slots = Slots::new();
        slots.set(SlotKey::Name, "Rahul Singh");

        let mut extracted = BTreeMap::new();
        extracted.insert(SlotKey::Name, String::new());
        extracted.insert(SlotKey::Date, "tomorrow".to_string());
        slots.merge(&extracted);

        assert_eq!(slots.get(SlotKey::Name), Some("Rahul Singh"));
        assert_eq!(slots.get(SlotKey::Date), Some("tomorrow"));
    }

    #[test]
    fn test_merge_keeps_existing_value() {
        let mut slots = Slots::new();
        slots.set(SlotKey::Time, "10 am");

        let mut extracted = BTreeMap::new();
        extracted.insert(SlotKey::Time, "noon".to_string());
        slots.merge(&extracted);

        // merge never overwrites a filled slot; corrections are explicit
        assert_eq!(slots.get(SlotKey::Time), Some("10 am"));

        slots.correct(SlotKey::Time, "noon");
        assert_eq!(slots.get(SlotKey::Time), Some("noon"));
    }

    #[test]
    fn test_first_missing_follows_priority_order() {
        let mut slots = Slots::new();
        assert_eq!(slots.first_missing(TaskType::Appointment), Some(SlotKey::Name));

        slots.set(SlotKey::Name, "A");
        slots.set(SlotKey::Date, "monday");
        // type outranks date even though date is already filled
        assert_eq!(
            slots.first_missing(TaskType::Appointment),
            Some(SlotKey::AppointmentType)
        );

        slots.set(SlotKey::AppointmentType, "checkup");
        slots.set(SlotKey::Time, "9 am");
        assert!(slots.is_complete(TaskType::Appointment));
    }

    #[test]
    fn test_refill_completes_on_name_alone() {
        let mut slots = Slots::new();
        slots.set(SlotKey::Name, "Meera");
        assert!(slots.is_complete(TaskType::Refill));
        assert!(!slots.is_complete(TaskType::Appointment));
    }

    #[test]
    fn test_start_flow_resets_slots_on_type_change() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "Rahul");

        // same type, not yet created: slot memory survives
        session.start_flow(TaskType::Appointment);
        assert_eq!(session.slots.get(SlotKey::Name), Some("Rahul"));

        session.start_flow(TaskType::Callback);
        assert!(session.slots.is_empty());
        assert_eq!(session.task_type, Some(TaskType::Callback));
        assert_eq!(session.task_type.unwrap().flow(), Flow::Callback);
    }

    #[test]
    fn test_mark_task_created_flips_once() {
        let mut session = Session::new("CA1");
        assert!(session.mark_task_created());
        assert!(!session.mark_task_created());
        assert!(session.task_created);
        assert!(session.appointment_confirmed);
    }

    #[test]
    fn test_restart_after_creation_clears_latch() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "Rahul");
        session.mark_task_created();

        session.start_flow(TaskType::Appointment);
        assert!(!session.task_created);
        assert!(session.slots.is_empty());
    }
}
