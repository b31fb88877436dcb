//! Core types and boundary traits for the clinic call assistant
//!
//! This crate defines the shared vocabulary of the dialogue core:
//! - Dialogue stages as a tagged enum (flow membership is type-level)
//! - Per-call session state with slot memory and failure counters
//! - Turn-level exchange types (intents, extractions, task/escalation records)
//! - Boundary traits for the classifier, session store, and sinks
//!
//! The dialogue logic itself lives in `clinic-agent-agent`; the regex
//! classifier in `clinic-agent-text-processing`.

pub mod error;
pub mod session;
pub mod stage;
pub mod traits;
pub mod turn;

pub use error::CoreError;
pub use session::{Session, Slots};
pub use stage::{Flow, SlotKey, Stage, TaskType};
pub use traits::{EntityExtractor, EscalationReporter, SessionStore, TaskSink};
pub use turn::{
    AssignedRole, EscalationReason, EscalationRecord, ExtractedSlots, Extraction, Intent,
    Priority, TaskRecord,
};
