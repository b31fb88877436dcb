//! Entity extractor contract

use crate::stage::Stage;
use crate::turn::Extraction;

/// Intent/entity classifier for one utterance.
///
/// Black box to the dialogue core. Must be pure, idempotent and
/// side-effect-free: the same `(text, stage)` input always yields the same
/// extraction. The current stage is passed so richer implementations can
/// suppress extractions that are invalid mid-flow; the returned intent may
/// still conflict with the active flow — the state machine resolves that,
/// never the extractor.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str, stage: &Stage) -> Extraction;
}
