//! Escalation policy
//!
//! Runs before the dialogue machine on every turn. Two hand-off classes:
//! hard triggers (emergency keywords, an explicit request for a person)
//! end the call immediately, while instability thresholds (three
//! consecutive failures of one kind) notify staff and let the call
//! continue. At most one escalation fires per turn, and the triggering
//! counter resets so the same streak cannot fire twice.

use clinic_agent_core::{EscalationReason, Session};
use serde::{Deserialize, Serialize};

/// Which per-session failure counter produced a threshold trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    FailedTurns,
    AiFailures,
    OtherIntent,
}

/// A single escalation decision for the current turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub reason: EscalationReason,
    pub details: String,
    /// Set for threshold triggers; the engine resets this counter.
    pub counter: Option<CounterKind>,
}

/// Keyword lists and thresholds for the policy. The defaults cover the
/// phrases the clinic staff asked for; deployments override per site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub emergency_keywords: Vec<String>,
    pub human_request_phrases: Vec<String>,
    /// Consecutive failures of one kind before staff are notified.
    pub failure_threshold: u32,
    /// Number forwarded to telephony for hard hand-offs, when known.
    pub transfer_number: Option<String>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        let emergency = [
            "cant breathe",
            "chest pain",
            "heart attack",
            "bleeding",
            "unconscious",
            "stroke",
            "overdose",
            "severe pain",
            "emergency",
            "passed out",
        ];
        let human = [
            "talk to a human",
            "speak to a human",
            "talk to a person",
            "speak to a person",
            "talk to someone",
            "speak to someone",
            "real person",
            "receptionist",
            "operator",
            "front desk",
        ];
        Self {
            emergency_keywords: emergency.iter().map(|s| s.to_string()).collect(),
            human_request_phrases: human.iter().map(|s| s.to_string()).collect(),
            failure_threshold: 3,
            transfer_number: None,
        }
    }
}

pub struct EscalationPolicy {
    config: EscalationConfig,
}

impl EscalationPolicy {
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Evaluate the policy for one turn. `recognized` is whether the
    /// extractor produced a usable intent or entity this turn; it feeds
    /// the tentative consecutive-unrecognized count so the third dead
    /// turn in a row fires here rather than one turn late.
    ///
    /// A session that already handed off never escalates again.
    pub fn check(&self, session: &Session, utterance: &str, recognized: bool) -> Option<Trigger> {
        if session.escalated {
            return None;
        }

        let normalized = normalize(utterance);

        if let Some(keyword) = self.match_phrase(&normalized, &self.config.emergency_keywords) {
            return Some(Trigger {
                reason: EscalationReason::MedicalEmergencyKeyword,
                details: format!("caller mentioned \"{keyword}\""),
                counter: None,
            });
        }

        if let Some(phrase) = self.match_phrase(&normalized, &self.config.human_request_phrases) {
            return Some(Trigger {
                reason: EscalationReason::RequestedHuman,
                details: format!("caller asked for a person (\"{phrase}\")"),
                counter: None,
            });
        }

        let threshold = self.config.failure_threshold;
        if threshold == 0 {
            return None;
        }

        if session.ai_failures >= threshold {
            return Some(Trigger {
                reason: EscalationReason::AiServiceInstability,
                details: format!("{} consecutive service errors", session.ai_failures),
                counter: Some(CounterKind::AiFailures),
            });
        }

        if session.failed_turns >= threshold {
            return Some(Trigger {
                reason: EscalationReason::AiServiceInstability,
                details: format!("{} consecutive degraded responses", session.failed_turns),
                counter: Some(CounterKind::FailedTurns),
            });
        }

        let other_streak = if recognized {
            session.other_intent_turns
        } else {
            session.other_intent_turns + 1
        };
        if other_streak >= threshold {
            return Some(Trigger {
                reason: EscalationReason::FailedUnderstanding,
                details: format!("{other_streak} consecutive turns not understood"),
                counter: Some(CounterKind::OtherIntent),
            });
        }

        None
    }

    fn match_phrase<'a>(&self, normalized: &str, phrases: &'a [String]) -> Option<&'a str> {
        phrases
            .iter()
            .map(String::as_str)
            .find(|p| normalized.contains(p))
    }
}

/// Lowercase and strip apostrophes so "can't breathe" matches the
/// keyword "cant breathe".
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .collect()
}
