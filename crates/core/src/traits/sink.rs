//! Task and escalation sink contracts
//!
//! All I/O happens here, after the state machine has produced its
//! decision. Sink failures must not corrupt session state that is already
//! published.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::turn::{EscalationRecord, TaskRecord};

/// Hardens a completed flow into a persisted task and queues the staff or
/// doctor notification.
///
/// Invoked exactly once per session the first time `task_created` flips
/// true (and once per fired escalation). Implementations should tolerate
/// retried delivery of the same signal, but callers guarantee at-most-once
/// per flow and must not assume more.
#[async_trait]
pub trait TaskSink: Send + Sync {
    async fn create_task(&self, task: TaskRecord) -> Result<(), CoreError>;
}

/// Writes an escalation record and its notification, and attempts the
/// live transfer for hand-off escalations.
#[async_trait]
pub trait EscalationReporter: Send + Sync {
    async fn report(&self, escalation: EscalationRecord) -> Result<(), CoreError>;
}
