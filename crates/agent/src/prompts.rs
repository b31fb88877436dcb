//! Fixed instruction prompts
//!
//! Every instruction the state machine can emit is a member of this enum,
//! keyed by the target state. The downstream phrasing call turns an
//! instruction into spoken language but must never alter its
//! informational content; determinism here is the core correctness
//! property — the same (stage, intent, entities) always selects the same
//! instruction family.

use serde::{Deserialize, Serialize};

use clinic_agent_core::{SlotKey, Stage};

/// Instruction for the phrasing layer, one per dialogue outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Opening move of every call
    Greet,
    /// Open-conversation default
    GeneralHelp,
    /// Slot prompts
    AskName,
    AskAppointmentType,
    AskDate,
    AskTime,
    AskCallbackTime,
    /// FAQ answered in place; optionally re-prompt the interrupted slot
    AnswerFaq { then_ask: Option<SlotKey> },
    /// Flow complete, task durably logged
    ConfirmTaskCreated,
    /// Status query with a task already on file
    TaskAlreadyLogged,
    /// Status query with nothing on file yet
    NoOpenRequest,
    /// Post-task default
    AnythingElse,
    /// Terminal goodbye; idempotent on retried delivery
    Goodbye,
    /// Emergency hand-off: live transfer in progress
    EmergencyHandoff,
    /// Caller asked for a person: hand-off to staff
    HumanHandoff,
    /// Threshold escalation: staff will follow up, call continues
    EscalationNotice,
}

impl Instruction {
    /// The slot prompt for a collecting stage
    pub fn ask(slot: SlotKey) -> Self {
        match slot {
            SlotKey::Name => Instruction::AskName,
            SlotKey::AppointmentType => Instruction::AskAppointmentType,
            SlotKey::Date => Instruction::AskDate,
            SlotKey::Time => Instruction::AskTime,
            SlotKey::CallbackTime => Instruction::AskCallbackTime,
        }
    }

    /// The prompt that re-asks whatever the given stage is waiting on.
    /// Used for silence/no-speech turns, which must never leave the
    /// caller with a dead line.
    pub fn for_stage(stage: &Stage) -> Self {
        match stage {
            Stage::Greeting => Instruction::Greet,
            Stage::General => Instruction::GeneralHelp,
            Stage::Collecting { slot, .. } => Instruction::ask(*slot),
            Stage::PostTask => Instruction::AnythingElse,
            Stage::EndCall => Instruction::Goodbye,
        }
    }

    /// Fixed prompt text handed to the phrasing call.
    pub fn text(&self) -> &'static str {
        match self {
            Instruction::Greet => "Greet the caller and ask how you can help.",
            Instruction::GeneralHelp => {
                "Answer the caller briefly and ask if anything else is needed."
            },
            Instruction::AskName => "Ask for the caller's full name.",
            Instruction::AskAppointmentType => {
                "Ask what type of appointment the caller needs."
            },
            Instruction::AskDate => "Ask which date works for the appointment.",
            Instruction::AskTime => "Ask what time works for the appointment.",
            Instruction::AskCallbackTime => "Ask what time staff should call back.",
            Instruction::AnswerFaq { then_ask: None } => {
                "Answer the caller's clinic question briefly."
            },
            Instruction::AnswerFaq { then_ask: Some(slot) } => match slot {
                SlotKey::Name => {
                    "Answer the caller's clinic question briefly, then ask again for their full name."
                },
                SlotKey::AppointmentType => {
                    "Answer the caller's clinic question briefly, then ask again what type of appointment they need."
                },
                SlotKey::Date => {
                    "Answer the caller's clinic question briefly, then ask again which date works."
                },
                SlotKey::Time => {
                    "Answer the caller's clinic question briefly, then ask again what time works."
                },
                SlotKey::CallbackTime => {
                    "Answer the caller's clinic question briefly, then ask again what time staff should call back."
                },
            },
            Instruction::ConfirmTaskCreated => {
                "Confirm the request has been logged and ask if anything else is needed."
            },
            Instruction::TaskAlreadyLogged => {
                "Tell the caller their request is already logged and staff will follow up."
            },
            Instruction::NoOpenRequest => {
                "Tell the caller no request is on file yet and ask what they need."
            },
            Instruction::AnythingElse => "Ask if there is anything else the caller needs.",
            Instruction::Goodbye => "Thank the caller and politely end the call.",
            Instruction::EmergencyHandoff => {
                "Tell the caller to stay on the line while they are connected to help right now."
            },
            Instruction::HumanHandoff => {
                "Tell the caller they are being connected to clinic staff now."
            },
            Instruction::EscalationNotice => {
                "Apologize for the difficulty and say a staff member will follow up shortly."
            },
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}
