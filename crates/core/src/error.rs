//! Boundary error taxonomy
//!
//! Turn processing itself never fails: every branch of the state machine
//! produces a valid (stage, instruction, slots) result. These errors exist
//! only at the I/O boundary, where the task sink and escalation reporter
//! talk to persistence and notification delivery.

use thiserror::Error;

/// Errors surfaced by the external collaborators
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("task sink error: {0}")]
    TaskSink(String),

    #[error("escalation reporter error: {0}")]
    EscalationReporter(String),
}
