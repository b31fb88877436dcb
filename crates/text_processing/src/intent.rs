//! Intent classification
//!
//! A fixed regex cascade over the utterance text. Patterns are evaluated
//! in priority order: exit and status checks outrank flow starts so that
//! "is my appointment done" is a status query, not a new booking.

use once_cell::sync::Lazy;
use regex::Regex;

use clinic_agent_core::Intent;

static EXIT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(goodbye|bye|hang up|that'?s all|nothing else|no,? (thanks|thank you))\b")
        .expect("exit pattern")
});

static STATUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(is it done|status|completed|is my (task|appointment|request|refill) done)\b")
        .expect("status pattern")
});

static APPOINTMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(appointment|schedule|reschedule|book|see the doctor)\b")
        .expect("appointment pattern")
});

static REFILL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(refill|prescription|medicine refill|my meds)\b").expect("refill pattern")
});

static CALLBACK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(call (me )?back|callback|ring me|return my call)\b")
        .expect("callback pattern")
});

static FAQ_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(hours|open|close|closing|location|located|address|insurance|parking|directions)\b")
        .expect("faq pattern")
});

/// Classify one utterance into an intent label.
///
/// Returns `Intent::Other` when nothing matches; the caller tracks
/// consecutive unrecognized turns for the escalation policy.
pub fn detect_intent(text: &str) -> Intent {
    if EXIT_PATTERN.is_match(text) {
        return Intent::Exit;
    }
    if STATUS_PATTERN.is_match(text) {
        return Intent::Status;
    }
    if APPOINTMENT_PATTERN.is_match(text) {
        return Intent::Appointment;
    }
    if REFILL_PATTERN.is_match(text) {
        return Intent::Refill;
    }
    if CALLBACK_PATTERN.is_match(text) {
        return Intent::Callback;
    }
    if FAQ_PATTERN.is_match(text) {
        return Intent::General;
    }
    Intent::Other
}

/// True when the utterance carries an informational/FAQ question, even if
/// another intent also matched. Used by the state machine's global FAQ
/// override, which must never consume flow progress.
pub fn is_faq(text: &str) -> bool {
    FAQ_PATTERN.is_match(text)
}
