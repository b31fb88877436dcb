//! Boundary traits
//!
//! Seams between the dialogue core and its external collaborators: the
//! intent/entity classifier, the session store, and the task/escalation
//! sinks. Tests mock all of these with fixtures.

mod extractor;
mod sink;
mod store;

pub use extractor::EntityExtractor;
pub use sink::{EscalationReporter, TaskSink};
pub use store::SessionStore;
