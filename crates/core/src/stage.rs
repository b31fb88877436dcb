//! Dialogue stages and slot schema
//!
//! The dialogue position is a tagged enum rather than a stage string, so
//! flow membership is a type-level fact instead of a `startswith` check.
//! Wire names (`APPOINTMENT_NAME`, `CALLBACK_TIME`, ...) are kept for the
//! transport layer and for persisted transcripts.

use serde::{Deserialize, Serialize};

/// Which slot-filling flow a collecting stage belongs to.
///
/// Refill has no flow of its own: it enters the appointment flow's name
/// stage and completes once the name is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Appointment,
    Callback,
}

impl Flow {
    /// Wire prefix used in stage identifiers
    pub fn wire_prefix(&self) -> &'static str {
        match self {
            Flow::Appointment => "APPOINTMENT",
            Flow::Callback => "CALLBACK",
        }
    }
}

/// A single named piece of information a flow must collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    /// Caller / patient name
    Name,
    /// Appointment type (checkup, consultation, follow-up, ...)
    AppointmentType,
    /// Appointment date
    Date,
    /// Appointment time
    Time,
    /// Preferred callback time
    CallbackTime,
}

impl SlotKey {
    /// Slot name as used in slot mappings and task records
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKey::Name => "name",
            SlotKey::AppointmentType => "appointment_type",
            SlotKey::Date => "date",
            SlotKey::Time => "time",
            SlotKey::CallbackTime => "callback_time",
        }
    }

    /// Wire suffix used in stage identifiers
    fn wire_suffix(&self) -> &'static str {
        match self {
            SlotKey::Name => "NAME",
            SlotKey::AppointmentType => "TYPE",
            SlotKey::Date => "DATE",
            SlotKey::Time => "TIME",
            SlotKey::CallbackTime => "TIME",
        }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active task type for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Appointment,
    Refill,
    Callback,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Appointment => "appointment",
            TaskType::Refill => "refill",
            TaskType::Callback => "callback",
        }
    }

    /// The slot-filling flow this task type runs through
    pub fn flow(&self) -> Flow {
        match self {
            TaskType::Appointment | TaskType::Refill => Flow::Appointment,
            TaskType::Callback => Flow::Callback,
        }
    }

    /// Required slots, in the fixed priority order they are asked in
    pub fn required_slots(&self) -> &'static [SlotKey] {
        match self {
            TaskType::Appointment => &[
                SlotKey::Name,
                SlotKey::AppointmentType,
                SlotKey::Date,
                SlotKey::Time,
            ],
            TaskType::Refill => &[SlotKey::Name],
            TaskType::Callback => &[SlotKey::Name, SlotKey::CallbackTime],
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialogue stage: the session's current position in the flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Initial state of every fresh session
    #[default]
    Greeting,
    /// Open conversation, no flow active
    General,
    /// Mid slot-filling: asking for `slot` within `flow`
    Collecting { flow: Flow, slot: SlotKey },
    /// Slots complete, task created; informational/confirmed behavior
    PostTask,
    /// Terminal: only the goodbye instruction is valid from here
    EndCall,
}

impl Stage {
    /// Stage identifier as delivered to the transport layer
    pub fn wire_name(&self) -> String {
        match self {
            Stage::Greeting => "GREETING".to_string(),
            Stage::General => "GENERAL".to_string(),
            Stage::Collecting { flow, slot } => {
                format!("{}_{}", flow.wire_prefix(), slot.wire_suffix())
            },
            Stage::PostTask => "POST_TASK".to_string(),
            Stage::EndCall => "END_CALL".to_string(),
        }
    }

    /// Flow this stage belongs to, if it is a collecting stage
    pub fn active_flow(&self) -> Option<Flow> {
        match self {
            Stage::Collecting { flow, .. } => Some(*flow),
            _ => None,
        }
    }

    /// Slot currently being asked for, if any
    pub fn asked_slot(&self) -> Option<SlotKey> {
        match self {
            Stage::Collecting { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// True when a new flow may be started from this stage
    pub fn accepts_flow_start(&self) -> bool {
        matches!(self, Stage::Greeting | Stage::General)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::EndCall)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.wire_name())
    }
}
