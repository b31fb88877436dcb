//! Regex-backed `EntityExtractor` implementation
//!
//! Combines the intent cascade and entity patterns into the classifier
//! the dialogue core consumes. Stage-aware: the same spoken time maps to
//! the appointment time slot or the callback time slot depending on which
//! flow is active, and slots that have no meaning in the active flow are
//! suppressed rather than left for the state machine to discard.

use clinic_agent_core::{EntityExtractor, Extraction, Flow, SlotKey, Stage};

use crate::entities;
use crate::intent::detect_intent;

/// Pure regex classifier; the production extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexExtractor;

impl RegexExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl EntityExtractor for RegexExtractor {
    fn extract(&self, text: &str, stage: &Stage) -> Extraction {
        let intent = detect_intent(text);

        let mut extraction = Extraction::new(intent);
        let entities = &mut extraction.entities;

        if let Some(name) = entities::extract_name(text) {
            entities.insert(SlotKey::Name, name);
        }

        // Time expressions are ambiguous between the two flows; resolve by
        // the active flow first, then by the turn's own intent.
        let callback_context = stage.active_flow() == Some(Flow::Callback)
            || intent == clinic_agent_core::Intent::Callback;

        if let Some(time) = entities::extract_time(text) {
            if callback_context {
                entities.insert(SlotKey::CallbackTime, time);
            } else {
                entities.insert(SlotKey::Time, time);
            }
        }

        // Dates and appointment types only exist in the appointment flow.
        if !callback_context {
            if let Some(date) = entities::extract_date(text) {
                entities.insert(SlotKey::Date, date);
            }
            if let Some(kind) = entities::extract_appointment_type(text) {
                entities.insert(SlotKey::AppointmentType, kind);
            }
        }

        tracing::debug!(
            intent = %intent,
            entities = entities.len(),
            stage = %stage,
            "classified utterance"
        );

        extraction
    }
}
