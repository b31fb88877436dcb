//! Clinic Call Agent
//!
//! Features:
//! - Stage-based dialogue management with slot filling
//! - Per-call session context store
//! - Escalation policy (emergency keywords, human requests, instability)
//! - At-most-once task creation on flow completion
//! - Fixed instruction catalogue for the downstream phrasing layer

pub mod config;
pub mod context;
pub mod dialogue;
pub mod engine;
pub mod escalation;
pub mod prompts;

pub use config::AgentConfig;
pub use context::InMemorySessionStore;
pub use dialogue::{next_turn, Decision};
pub use engine::{PhrasingOutcome, TurnEngine, TurnOutput};
pub use escalation::{EscalationConfig, EscalationPolicy, Trigger};
pub use prompts::Instruction;
