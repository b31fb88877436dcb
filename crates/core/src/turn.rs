//! Turn-level exchange types
//!
//! Inputs and outputs that cross the dialogue core's boundary each turn:
//! the classifier's verdict on one utterance, and the records handed to
//! the task sink and escalation reporter once a turn resolves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stage::{SlotKey, TaskType};

/// Intent label for one utterance.
///
/// Best-effort: the extractor may return a label that conflicts with an
/// active flow (e.g. `General` mid slot-filling). The state machine, not
/// the extractor, resolves that via stage-locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Book or reschedule an appointment
    Appointment,
    /// Prescription refill request
    Refill,
    /// Ask staff to call back
    Callback,
    /// Informational / FAQ question (hours, location, insurance)
    General,
    /// "Is my request done?" style status check
    Status,
    /// Goodbye / end of call
    Exit,
    /// Nothing recognized
    Other,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Appointment => "appointment",
            Intent::Refill => "refill",
            Intent::Callback => "callback",
            Intent::General => "general",
            Intent::Status => "task_status",
            Intent::Exit => "exit",
            Intent::Other => "other",
        }
    }

    /// Task type this intent starts, if it is a flow-start intent
    pub fn flow_start(&self) -> Option<TaskType> {
        match self {
            Intent::Appointment => Some(TaskType::Appointment),
            Intent::Refill => Some(TaskType::Refill),
            Intent::Callback => Some(TaskType::Callback),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slot values pulled out of a single utterance
pub type ExtractedSlots = BTreeMap<SlotKey, String>;

/// Classifier output for one utterance: best-effort intent plus whatever
/// slot values were recognizable. Either side may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub intent: Option<Intent>,
    pub entities: ExtractedSlots,
}

impl Extraction {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent: Some(intent),
            entities: ExtractedSlots::new(),
        }
    }

    pub fn with_entity(mut self, key: SlotKey, value: impl Into<String>) -> Self {
        self.entities.insert(key, value.into());
        self
    }
}

/// Task priority, mirrored in the persisted task row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Urgent => "urgent",
        }
    }
}

/// Who the task is routed to for follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedRole {
    #[default]
    Staff,
    Doctor,
}

impl AssignedRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignedRole::Staff => "staff",
            AssignedRole::Doctor => "doctor",
        }
    }

    /// Refills go to the doctor, everything else to staff
    pub fn for_task(task_type: TaskType) -> Self {
        match task_type {
            TaskType::Refill => AssignedRole::Doctor,
            _ => AssignedRole::Staff,
        }
    }
}

/// Hardened task handed to the sink once a flow completes (or an
/// escalation needs staff follow-up).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub call_id: String,
    pub task_type: TaskType,
    pub slots: BTreeMap<SlotKey, String>,
    pub callback_number: Option<String>,
    pub priority: Priority,
    pub assigned_role: AssignedRole,
    /// Raw utterance the completing turn carried, for staff context
    pub details: String,
}

/// Why a call was escalated. `as_str` values are the stable reason codes
/// persisted with the escalation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// Emergency keyword matched in the utterance
    MedicalEmergencyKeyword,
    /// Caller explicitly asked for a person
    RequestedHuman,
    /// Three consecutive turns with unrecognized intent
    FailedUnderstanding,
    /// Phrasing service degraded or errored three turns in a row
    AiServiceInstability,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::MedicalEmergencyKeyword => "medical_emergency_keyword",
            EscalationReason::RequestedHuman => "requested_human",
            EscalationReason::FailedUnderstanding => "failed_understanding_3_turns",
            EscalationReason::AiServiceInstability => "ai_service_instability",
        }
    }

    /// Emergency and explicit human requests end normal dialogue; the
    /// threshold escalations let the caller continue.
    pub fn is_hand_off(&self) -> bool {
        matches!(
            self,
            EscalationReason::MedicalEmergencyKeyword | EscalationReason::RequestedHuman
        )
    }

    pub fn priority(&self) -> Priority {
        match self {
            EscalationReason::MedicalEmergencyKeyword => Priority::Urgent,
            _ => Priority::Normal,
        }
    }
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalation handed to the reporter: reason code, triggering utterance,
/// and the transfer destination for live hand-offs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub call_id: String,
    pub reason: EscalationReason,
    /// The utterance (or counter description) that triggered this
    pub details: String,
    pub priority: Priority,
    /// Destination number for a live transfer attempt, if configured
    pub transfer_number: Option<String>,
}
