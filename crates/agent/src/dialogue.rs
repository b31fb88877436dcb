//! Dialogue state machine
//!
//! The core of the assistant: a pure function from
//! `(session, intent, entities, raw utterance)` to the next stage, the
//! fixed instruction to phrase, and the updated slot set. No I/O happens
//! here; the engine publishes the result and drives the sinks.
//!
//! Transition rules, evaluated top to bottom each turn:
//! 1. Terminal stage repeats the goodbye (idempotent on retried delivery)
//! 2. FAQ questions are answered in place, never consuming flow progress
//! 3. Exit ends the call from any stage
//! 4. Stage-lock: inside a flow, every other intent is treated as flow
//!    content, so an incidental word choice cannot eject the caller
//! 5. Flow start from open conversation
//! 6. Status check
//! 7. Post-task: restart, or a generic "anything else"
//! 8. Greeting / open-conversation defaults

use clinic_agent_core::{
    ExtractedSlots, Flow, Intent, Session, SlotKey, Slots, Stage, TaskType,
};

use crate::prompts::Instruction;

/// Outcome of one turn: everything the engine needs to publish the next
/// session state and decide whether the task sink fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub stage: Stage,
    pub instruction: Instruction,
    pub slots: Slots,
    pub task_type: Option<TaskType>,
    /// The active flow's slot set became complete this turn. The engine
    /// fires the task sink iff the session's creation latch is clear.
    pub completed: bool,
    /// An explicit new-flow intent restarted slot-filling after a
    /// completed task; the creation latch must be cleared first.
    pub restarted: bool,
    /// The turn advanced the dialogue (recognized intent or newly filled
    /// slot). Feeds the consecutive-unrecognized-turn counter.
    pub made_progress: bool,
}

impl Decision {
    fn keep(session: &Session, stage: Stage, instruction: Instruction, progress: bool) -> Self {
        Self {
            stage,
            instruction,
            slots: session.slots.clone(),
            task_type: session.task_type,
            completed: false,
            restarted: false,
            made_progress: progress,
        }
    }
}

/// Compute the next dialogue state for one turn.
///
/// Pure and deterministic: the same `(session, intent, entities, text)`
/// always yields the same decision. Every input produces a valid result;
/// there is no failure branch.
pub fn next_turn(
    session: &Session,
    intent: Intent,
    entities: &ExtractedSlots,
    raw_text: &str,
) -> Decision {
    // Terminal: the only valid output is the goodbye, however often the
    // transport retries the final callback.
    if session.stage.is_terminal() {
        return Decision::keep(session, Stage::EndCall, Instruction::Goodbye, false);
    }

    // Global FAQ override: answer in place. Mid-flow, re-prompt for the
    // interrupted slot; progress and slot memory are untouched.
    if intent == Intent::General {
        let stage = match session.stage {
            Stage::Greeting => Stage::General,
            other => other,
        };
        let instruction = Instruction::AnswerFaq {
            then_ask: session.stage.asked_slot(),
        };
        return Decision::keep(session, stage, instruction, true);
    }

    // Exit is unconditional from any stage.
    if intent == Intent::Exit {
        return Decision::keep(session, Stage::EndCall, Instruction::Goodbye, true);
    }

    // Stage-lock: once inside a flow, the turn belongs to that flow no
    // matter what the extractor labelled it.
    if let Stage::Collecting { flow, slot } = session.stage {
        return fill_slots(session, flow, slot, intent, entities, raw_text);
    }

    // Flow start from open conversation. A completed flow is never
    // restarted silently: the latch and slots reset explicitly.
    if session.stage.accepts_flow_start() {
        if let Some(task_type) = intent.flow_start() {
            return enter_flow(session, task_type, entities, session.task_created);
        }
    }

    // Status / confirmation check.
    if intent == Intent::Status {
        if session.task_created {
            return Decision::keep(session, Stage::PostTask, Instruction::TaskAlreadyLogged, true);
        }
        let stage = match session.stage {
            Stage::Greeting => Stage::General,
            other => other,
        };
        return Decision::keep(session, stage, Instruction::NoOpenRequest, true);
    }

    // Post-task: a new flow intent re-enters slot-filling, anything else
    // gets the generic follow-up.
    if session.stage == Stage::PostTask {
        if let Some(task_type) = intent.flow_start() {
            return enter_flow(session, task_type, entities, true);
        }
        return Decision::keep(
            session,
            Stage::PostTask,
            Instruction::AnythingElse,
            intent != Intent::Other,
        );
    }

    // First turn of the call: greet and open the conversation.
    if session.stage == Stage::Greeting {
        return Decision::keep(session, Stage::General, Instruction::Greet, true);
    }

    Decision::keep(
        session,
        Stage::General,
        Instruction::GeneralHelp,
        intent != Intent::Other,
    )
}

/// Begin (or restart) a slot-filling flow and resolve the first prompt.
fn enter_flow(
    session: &Session,
    task_type: TaskType,
    entities: &ExtractedSlots,
    restart: bool,
) -> Decision {
    let mut slots = if restart || session.task_type != Some(task_type) {
        Slots::new()
    } else {
        session.slots.clone()
    };
    merge_for_flow(&mut slots, task_type, entities);

    resolve(slots, task_type, restart)
}

/// Stage-locked slot filling for an active flow.
fn fill_slots(
    session: &Session,
    flow: Flow,
    asked: SlotKey,
    intent: Intent,
    entities: &ExtractedSlots,
    raw_text: &str,
) -> Decision {
    // A collecting stage always has a task type; fall back to the flow's
    // own if the session was evicted mid-flow.
    let task_type = session.task_type.unwrap_or(match flow {
        Flow::Appointment => TaskType::Appointment,
        Flow::Callback => TaskType::Callback,
    });

    let mut slots = session.slots.clone();
    let before = slots.len();
    merge_for_flow(&mut slots, task_type, entities);

    // Extractor miss on a direct-answer turn: accept the raw utterance
    // for the slot that was just asked, when it plausibly answers it.
    if !slots.is_filled(asked) && intent == Intent::Other {
        if let Some(answer) = direct_answer(asked, raw_text) {
            slots.set(asked, answer);
        }
    }

    let filled_any = slots.len() > before;
    let mut decision = resolve(slots, task_type, false);
    if !decision.completed {
        decision.made_progress = filled_any;
    }
    decision
}

/// Find the first missing slot and the matching prompt, or complete.
fn resolve(slots: Slots, task_type: TaskType, restarted: bool) -> Decision {
    match slots.first_missing(task_type) {
        Some(missing) => Decision {
            stage: Stage::Collecting {
                flow: task_type.flow(),
                slot: missing,
            },
            instruction: Instruction::ask(missing),
            slots,
            task_type: Some(task_type),
            completed: false,
            restarted,
            made_progress: true,
        },
        None => Decision {
            stage: Stage::PostTask,
            instruction: Instruction::ConfirmTaskCreated,
            slots,
            task_type: Some(task_type),
            completed: true,
            restarted,
            made_progress: true,
        },
    }
}

/// Key-wise union of extracted values into the active flow's slot set.
/// A filled slot is never overwritten; foreign slots are ignored.
fn merge_for_flow(slots: &mut Slots, task_type: TaskType, entities: &ExtractedSlots) {
    for key in task_type.required_slots() {
        if let Some(value) = entities.get(key) {
            if !slots.is_filled(*key) {
                slots.set(*key, value.clone());
            }
        }
    }
}

const DAY_WORDS: &[&str] = &[
    "today",
    "tomorrow",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const DAY_PART_WORDS: &[&str] = &["morning", "afternoon", "evening", "noon", "midday"];

const NAME_STOPWORDS: &[&str] = &[
    "yes", "no", "okay", "ok", "hello", "hi", "hey", "what", "when", "where", "why", "how", "um",
    "uh", "please", "thanks",
];

/// Is the raw utterance a plausible direct answer to the just-asked slot?
fn direct_answer(slot: SlotKey, raw_text: &str) -> Option<String> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    match slot {
        SlotKey::Name => {
            let plausible = (1..=4).contains(&words.len())
                && trimmed.len() < 60
                && trimmed
                    .chars()
                    .all(|c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '-' | '.'))
                && !NAME_STOPWORDS.contains(&words[0]);
            plausible.then(|| trimmed.to_string())
        },
        SlotKey::AppointmentType => {
            let plausible = words.len() <= 3
                && trimmed.len() < 40
                && trimmed
                    .chars()
                    .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-'));
            plausible.then(|| lower.clone())
        },
        SlotKey::Date => words
            .iter()
            .any(|w| DAY_WORDS.contains(w))
            .then(|| trimmed.to_string()),
        SlotKey::Time | SlotKey::CallbackTime => {
            let has_day_part = words.iter().any(|w| DAY_PART_WORDS.contains(w));
            let has_clock = lower.contains("am") || lower.contains("pm");
            let has_digit = lower.chars().any(|c| c.is_ascii_digit());
            (has_day_part || (has_clock && has_digit)).then(|| trimmed.to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_agent_core::ExtractedSlots;

    fn collecting(flow: Flow, slot: SlotKey) -> Stage {
        Stage::Collecting { flow, slot }
    }

    fn no_entities() -> ExtractedSlots {
        ExtractedSlots::new()
    }

    #[test]
    fn test_appointment_intent_from_greeting_asks_name() {
        // §8 Scenario A
        let session = Session::new("CA1");
        let decision = next_turn(&session, Intent::Appointment, &no_entities(), "I need an appointment");

        assert_eq!(decision.stage, collecting(Flow::Appointment, SlotKey::Name));
        assert_eq!(decision.instruction, Instruction::AskName);
        assert_eq!(decision.task_type, Some(TaskType::Appointment));
        assert!(!decision.completed);
    }

    #[test]
    fn test_bare_name_accepted_as_direct_answer() {
        // §8 Scenario B
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.stage = collecting(Flow::Appointment, SlotKey::Name);

        let decision = next_turn(&session, Intent::Other, &no_entities(), "Rahul Singh");

        assert_eq!(decision.slots.get(SlotKey::Name), Some("Rahul Singh"));
        assert_eq!(decision.stage, collecting(Flow::Appointment, SlotKey::AppointmentType));
        assert_eq!(decision.instruction, Instruction::AskAppointmentType);
        assert!(decision.made_progress);
    }

    #[test]
    fn test_last_slot_completes_flow() {
        // §8 Scenario C
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "A");
        session.slots.set(SlotKey::AppointmentType, "checkup");
        session.slots.set(SlotKey::Date, "tomorrow");
        session.stage = collecting(Flow::Appointment, SlotKey::Time);

        let decision = next_turn(&session, Intent::Other, &no_entities(), "morning");

        assert_eq!(decision.slots.get(SlotKey::Time), Some("morning"));
        assert_eq!(decision.stage, Stage::PostTask);
        assert_eq!(decision.instruction, Instruction::ConfirmTaskCreated);
        assert!(decision.completed);
    }

    #[test]
    fn test_faq_mid_flow_preserves_progress_and_reprompts() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "Rahul");
        session.stage = collecting(Flow::Appointment, SlotKey::Date);

        let decision = next_turn(&session, Intent::General, &no_entities(), "what are your hours");

        assert_eq!(decision.stage, collecting(Flow::Appointment, SlotKey::Date));
        assert_eq!(decision.slots.get(SlotKey::Name), Some("Rahul"));
        assert_eq!(
            decision.instruction,
            Instruction::AnswerFaq {
                then_ask: Some(SlotKey::Date)
            }
        );
        assert!(!decision.completed);
    }

    #[test]
    fn test_faq_post_task_leaves_everything_alone() {
        // §8 Scenario E
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "A");
        session.mark_task_created();
        session.stage = Stage::PostTask;

        let decision = next_turn(&session, Intent::General, &no_entities(), "what are your hours");

        assert_eq!(decision.stage, Stage::PostTask);
        assert_eq!(decision.instruction, Instruction::AnswerFaq { then_ask: None });
        assert_eq!(decision.slots, session.slots);
        assert!(!decision.completed);
        assert!(!decision.restarted);
    }

    #[test]
    fn test_stage_lock_ignores_conflicting_intent() {
        // "I want to book my holiday" mid-callback must not eject the
        // caller into the appointment flow.
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Callback);
        session.slots.set(SlotKey::Name, "Meera");
        session.stage = collecting(Flow::Callback, SlotKey::CallbackTime);

        let decision = next_turn(&session, Intent::Appointment, &no_entities(), "book whatever");

        assert_eq!(decision.task_type, Some(TaskType::Callback));
        assert_eq!(decision.stage, collecting(Flow::Callback, SlotKey::CallbackTime));
    }

    #[test]
    fn test_exit_wins_even_mid_flow() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.stage = collecting(Flow::Appointment, SlotKey::Date);

        let decision = next_turn(&session, Intent::Exit, &no_entities(), "goodbye");

        assert_eq!(decision.stage, Stage::EndCall);
        assert_eq!(decision.instruction, Instruction::Goodbye);
    }

    #[test]
    fn test_terminal_stage_is_idempotent() {
        let mut session = Session::new("CA1");
        session.stage = Stage::EndCall;

        for _ in 0..3 {
            let decision = next_turn(&session, Intent::Appointment, &no_entities(), "hello?");
            assert_eq!(decision.stage, Stage::EndCall);
            assert_eq!(decision.instruction, Instruction::Goodbye);
            assert!(!decision.completed);
        }
    }

    #[test]
    fn test_refill_completes_on_name() {
        let session = Session::new("CA1");
        let mut entities = ExtractedSlots::new();
        entities.insert(SlotKey::Name, "Meera Patel".to_string());

        let decision = next_turn(
            &session,
            Intent::Refill,
            &entities,
            "I need a refill, my name is Meera Patel",
        );

        assert_eq!(decision.task_type, Some(TaskType::Refill));
        assert_eq!(decision.stage, Stage::PostTask);
        assert!(decision.completed);
    }

    #[test]
    fn test_callback_flow_asks_callback_time_after_name() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Callback);
        session.stage = collecting(Flow::Callback, SlotKey::Name);

        let decision = next_turn(&session, Intent::Other, &no_entities(), "Meera");

        assert_eq!(decision.stage, collecting(Flow::Callback, SlotKey::CallbackTime));
        assert_eq!(decision.instruction, Instruction::AskCallbackTime);
    }

    #[test]
    fn test_filled_slot_survives_empty_extraction() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "Rahul");
        session.stage = collecting(Flow::Appointment, SlotKey::Date);

        let mut entities = ExtractedSlots::new();
        entities.insert(SlotKey::Name, String::new());

        let decision = next_turn(&session, Intent::Other, &entities, "hmm");
        assert_eq!(decision.slots.get(SlotKey::Name), Some("Rahul"));
    }

    #[test]
    fn test_status_with_task_created() {
        let mut session = Session::new("CA1");
        session.stage = Stage::General;
        session.mark_task_created();

        let decision = next_turn(&session, Intent::Status, &no_entities(), "is it done");
        assert_eq!(decision.stage, Stage::PostTask);
        assert_eq!(decision.instruction, Instruction::TaskAlreadyLogged);
    }

    #[test]
    fn test_status_without_task() {
        let mut session = Session::new("CA1");
        session.stage = Stage::General;

        let decision = next_turn(&session, Intent::Status, &no_entities(), "is it done");
        assert_eq!(decision.stage, Stage::General);
        assert_eq!(decision.instruction, Instruction::NoOpenRequest);
    }

    #[test]
    fn test_post_task_restart_clears_latch_and_slots() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.slots.set(SlotKey::Name, "Rahul");
        session.slots.set(SlotKey::AppointmentType, "checkup");
        session.slots.set(SlotKey::Date, "monday");
        session.slots.set(SlotKey::Time, "9 am");
        session.mark_task_created();
        session.stage = Stage::PostTask;

        let decision = next_turn(&session, Intent::Callback, &no_entities(), "also call me back");

        assert!(decision.restarted);
        assert_eq!(decision.task_type, Some(TaskType::Callback));
        assert_eq!(decision.stage, collecting(Flow::Callback, SlotKey::Name));
        assert!(decision.slots.is_empty());
    }

    #[test]
    fn test_post_task_default_is_anything_else() {
        let mut session = Session::new("CA1");
        session.mark_task_created();
        session.stage = Stage::PostTask;

        let decision = next_turn(&session, Intent::Other, &no_entities(), "hmm");
        assert_eq!(decision.stage, Stage::PostTask);
        assert_eq!(decision.instruction, Instruction::AnythingElse);
        assert!(!decision.made_progress);
    }

    #[test]
    fn test_greeting_without_flow_intent_greets() {
        let session = Session::new("CA1");
        let decision = next_turn(&session, Intent::Other, &no_entities(), "hello");
        assert_eq!(decision.stage, Stage::General);
        assert_eq!(decision.instruction, Instruction::Greet);
    }

    #[test]
    fn test_direct_answer_heuristics() {
        assert!(direct_answer(SlotKey::Name, "Rahul Singh").is_some());
        assert!(direct_answer(SlotKey::Name, "okay then").is_none());
        assert!(direct_answer(SlotKey::Name, "call me at 555").is_none());
        assert!(direct_answer(SlotKey::Time, "morning").is_some());
        assert!(direct_answer(SlotKey::Time, "10 am").is_some());
        assert!(direct_answer(SlotKey::Time, "whenever suits").is_none());
        assert!(direct_answer(SlotKey::Date, "next friday").is_some());
        assert!(direct_answer(SlotKey::Date, "soonish").is_none());
        assert!(direct_answer(SlotKey::AppointmentType, "checkup").is_some());
        assert!(direct_answer(SlotKey::CallbackTime, "evening").is_some());
    }

    #[test]
    fn test_direct_answer_requires_unrecognized_intent() {
        // A recognized intent is not a direct answer even if it looks
        // like one ("book" is four letters and alphabetic).
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.stage = collecting(Flow::Appointment, SlotKey::Name);

        let decision = next_turn(&session, Intent::Appointment, &no_entities(), "book");
        assert!(!decision.slots.is_filled(SlotKey::Name));
        assert_eq!(decision.stage, collecting(Flow::Appointment, SlotKey::Name));
    }

    #[test]
    fn test_determinism() {
        let mut session = Session::new("CA1");
        session.start_flow(TaskType::Appointment);
        session.stage = collecting(Flow::Appointment, SlotKey::Name);

        let a = next_turn(&session, Intent::Other, &no_entities(), "Rahul Singh");
        let b = next_turn(&session, Intent::Other, &no_entities(), "Rahul Singh");
        assert_eq!(a, b);
    }
}
