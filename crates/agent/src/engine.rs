//! Turn engine
//!
//! Orchestrates one telephone turn end to end: load the session, run the
//! escalation pre-check, run the dialogue machine, fire the task sink on
//! flow completion, and publish the whole updated session back to the
//! store. The transport layer calls `process_turn` once per caller
//! utterance and `end_call` when the line drops.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use clinic_agent_core::{
    AssignedRole, EntityExtractor, EscalationReason, EscalationRecord, EscalationReporter, Intent,
    Priority, Session, SessionStore, Slots, Stage, TaskRecord, TaskSink,
};

use crate::config::AgentConfig;
use crate::dialogue;
use crate::escalation::{CounterKind, EscalationPolicy, Trigger};
use crate::prompts::Instruction;

/// What the transport speaks (after phrasing) and whether to hang up.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub stage: Stage,
    pub instruction: Instruction,
    pub slots: Slots,
    pub escalation: Option<EscalationReason>,
    pub end_call: bool,
}

/// How the downstream phrasing service handled the last instruction.
/// Reported back by the transport so the instability counters see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhrasingOutcome {
    /// Phrased normally
    Ok,
    /// Service degraded to a canned fallback line
    Fallback,
    /// Service errored outright
    Error,
}

pub struct TurnEngine {
    store: Arc<dyn SessionStore>,
    extractor: Arc<dyn EntityExtractor>,
    tasks: Arc<dyn TaskSink>,
    escalations: Arc<dyn EscalationReporter>,
    policy: EscalationPolicy,
    config: AgentConfig,
}

impl TurnEngine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        extractor: Arc<dyn EntityExtractor>,
        tasks: Arc<dyn TaskSink>,
        escalations: Arc<dyn EscalationReporter>,
        config: AgentConfig,
    ) -> Self {
        let policy = EscalationPolicy::new(config.escalation.clone());
        Self {
            store,
            extractor,
            tasks,
            escalations,
            policy,
            config,
        }
    }

    /// Engine wired with the bundled regex extractor and the in-memory
    /// session store, for deployments without an external classifier.
    pub fn with_defaults(
        tasks: Arc<dyn TaskSink>,
        escalations: Arc<dyn EscalationReporter>,
        config: AgentConfig,
    ) -> Self {
        Self::new(
            Arc::new(crate::context::InMemorySessionStore::new()),
            Arc::new(clinic_agent_text_processing::RegexExtractor::new()),
            tasks,
            escalations,
            config,
        )
    }

    /// Process one caller utterance and return what to say next.
    ///
    /// The session is published back to the store exactly once, at the
    /// end of the turn, so a concurrent reader never sees a half-updated
    /// stage/slot pair.
    pub async fn process_turn(
        &self,
        call_id: &str,
        utterance: &str,
        callback_number: Option<&str>,
    ) -> TurnOutput {
        let mut session = self.store.get(call_id);
        session.turn_count += 1;

        let trimmed = utterance.trim();

        // Silence: re-ask whatever the current stage wants, touch nothing.
        if trimmed.is_empty() {
            session.no_speech_count += 1;
            let instruction = Instruction::for_stage(&session.stage);
            debug!(call_id, no_speech = session.no_speech_count, "empty utterance, re-prompting");
            let output = TurnOutput {
                stage: session.stage,
                instruction,
                slots: session.slots.clone(),
                escalation: None,
                end_call: session.stage.is_terminal(),
            };
            self.store.update(call_id, session);
            return output;
        }
        session.no_speech_count = 0;

        let extraction = self.extractor.extract(trimmed, &session.stage);
        let intent = extraction.intent.unwrap_or(Intent::Other);
        let recognized = intent != Intent::Other || !extraction.entities.is_empty();

        if !session.stage.is_terminal() {
            if let Some(trigger) = self.policy.check(&session, trimmed, recognized) {
                return self
                    .escalate(call_id, session, trigger, callback_number)
                    .await;
            }
        }

        // Demo cap on call length; 0 disables.
        if self.config.max_turns > 0
            && session.turn_count >= self.config.max_turns
            && !session.stage.is_terminal()
        {
            info!(call_id, turns = session.turn_count, "turn cap reached, ending call");
            session.stage = Stage::EndCall;
            let output = TurnOutput {
                stage: Stage::EndCall,
                instruction: Instruction::Goodbye,
                slots: session.slots.clone(),
                escalation: None,
                end_call: true,
            };
            self.store.update(call_id, session);
            return output;
        }

        let decision = dialogue::next_turn(&session, intent, &extraction.entities, trimmed);

        if decision.restarted {
            debug!(call_id, "new flow after completed task, clearing creation latch");
            session.task_created = false;
            session.appointment_confirmed = false;
        }
        session.task_type = decision.task_type;
        session.slots = decision.slots.clone();
        session.stage = decision.stage;

        // At-most-once task creation: the latch flips only after the sink
        // accepts the record, so a sink failure leaves a retry possible.
        if decision.completed && !session.task_created {
            if let Some(task_type) = decision.task_type {
                let record = TaskRecord {
                    call_id: call_id.to_string(),
                    task_type,
                    slots: session.slots.iter().map(|(k, v)| (k, v.to_string())).collect(),
                    callback_number: callback_number.map(str::to_string),
                    priority: Priority::Normal,
                    assigned_role: AssignedRole::for_task(task_type),
                    details: trimmed.to_string(),
                };
                match self.tasks.create_task(record).await {
                    Ok(()) => {
                        session.mark_task_created();
                        info!(call_id, task_type = task_type.as_str(), "task created");
                    },
                    Err(err) => {
                        warn!(call_id, %err, "task sink rejected record, latch left open");
                    },
                }
            }
        }

        if decision.made_progress || intent != Intent::Other {
            session.other_intent_turns = 0;
        } else {
            session.other_intent_turns += 1;
        }

        // Conversation-quality flags for the call review dashboard.
        let bot_text = decision.instruction.text();
        if bot_text == session.last_bot_text {
            session.bot_repeat_count += 1;
            if session.bot_repeat_count >= 2 {
                warn!(call_id, repeats = session.bot_repeat_count, "assistant repeating itself");
            }
        } else {
            session.bot_repeat_count = 0;
        }
        if trimmed == session.last_user_text {
            debug!(call_id, "caller repeated themselves");
        }
        session.last_user_text = trimmed.to_string();
        session.last_bot_text = bot_text.to_string();

        let output = TurnOutput {
            stage: session.stage,
            instruction: decision.instruction,
            slots: session.slots.clone(),
            escalation: None,
            end_call: session.stage.is_terminal(),
        };
        self.store.update(call_id, session);
        output
    }

    async fn escalate(
        &self,
        call_id: &str,
        mut session: Session,
        trigger: Trigger,
        callback_number: Option<&str>,
    ) -> TurnOutput {
        let reason = trigger.reason;
        info!(call_id, reason = reason.as_str(), details = %trigger.details, "escalating");

        let record = EscalationRecord {
            call_id: call_id.to_string(),
            reason,
            details: trigger.details,
            priority: reason.priority(),
            transfer_number: if reason.is_hand_off() {
                self.policy.config().transfer_number.clone()
            } else {
                None
            },
        };
        // Reporting failure must not break the turn; the caller still
        // gets handed off or notified.
        if let Err(err) = self.escalations.report(record).await {
            error!(call_id, %err, "escalation reporter failed");
        }

        match trigger.counter {
            Some(CounterKind::FailedTurns) => session.failed_turns = 0,
            Some(CounterKind::AiFailures) => session.ai_failures = 0,
            Some(CounterKind::OtherIntent) => session.other_intent_turns = 0,
            None => {},
        }

        let output = if reason.is_hand_off() {
            session.escalated = true;

            // If a flow was underway, open a follow-up task so staff
            // call back even if the live transfer drops.
            if !session.task_created {
                if let Some(task_type) = session.task_type {
                    let record = TaskRecord {
                        call_id: call_id.to_string(),
                        task_type,
                        slots: session.slots.iter().map(|(k, v)| (k, v.to_string())).collect(),
                        callback_number: callback_number.map(str::to_string),
                        priority: reason.priority(),
                        assigned_role: AssignedRole::for_task(task_type),
                        details: format!("interrupted by escalation: {reason}"),
                    };
                    match self.tasks.create_task(record).await {
                        Ok(()) => {
                            session.mark_task_created();
                        },
                        Err(err) => warn!(call_id, %err, "follow-up task not recorded"),
                    }
                }
            }

            session.stage = Stage::EndCall;
            let instruction = match reason {
                EscalationReason::MedicalEmergencyKeyword => Instruction::EmergencyHandoff,
                _ => Instruction::HumanHandoff,
            };
            TurnOutput {
                stage: Stage::EndCall,
                instruction,
                slots: session.slots.clone(),
                escalation: Some(reason),
                end_call: true,
            }
        } else {
            // Instability: staff are notified, the caller keeps going
            // from exactly where they were.
            TurnOutput {
                stage: session.stage,
                instruction: Instruction::EscalationNotice,
                slots: session.slots.clone(),
                escalation: Some(reason),
                end_call: false,
            }
        };

        self.store.update(call_id, session);
        output
    }

    /// Feed the phrasing service's result for the last turn back into the
    /// instability counters. `Ok` clears both streaks.
    pub fn record_phrasing_outcome(&self, call_id: &str, outcome: PhrasingOutcome) {
        let mut session = self.store.get(call_id);
        match outcome {
            PhrasingOutcome::Ok => {
                session.failed_turns = 0;
                session.ai_failures = 0;
            },
            PhrasingOutcome::Fallback => session.failed_turns += 1,
            PhrasingOutcome::Error => session.ai_failures += 1,
        }
        self.store.update(call_id, session);
    }

    /// Tear down the call's session once telephony reports hang-up.
    pub fn end_call(&self, call_id: &str) {
        self.store.delete(call_id);
    }
}
