//! Entity extraction
//!
//! Best-effort slot values from one utterance. Extraction is deliberately
//! conservative: a miss here is recoverable (the state machine re-prompts
//! or falls back to the raw utterance on direct-answer turns), while a
//! false positive silently fills the wrong slot.

use once_cell::sync::Lazy;
use regex::Regex;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:my name is|this is|i am|i'm)\s+([A-Za-z]+(?:\s+[A-Za-z]+){0,2})")
        .expect("name pattern")
});

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(today|tomorrow|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("date pattern")
});

static CLOCK_TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2}(?::\d{2})?\s?(?:am|pm))\b").expect("time pattern"));

static DAY_PART_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(morning|afternoon|evening|noon|midday)\b").expect("day part pattern")
});

static APPOINTMENT_TYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(check[\s-]?up|consultation|follow[\s-]?up|vaccination|physical|cleaning)\b")
        .expect("appointment type pattern")
});

/// Name introduced with a lead-in phrase ("my name is ...", "this is ...")
pub fn extract_name(text: &str) -> Option<String> {
    NAME_PATTERN
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// A relative day or weekday mention
pub fn extract_date(text: &str) -> Option<String> {
    DATE_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// A clock time ("10 am", "4:30 pm") or day part ("morning")
pub fn extract_time(text: &str) -> Option<String> {
    CLOCK_TIME_PATTERN
        .find(text)
        .or_else(|| DAY_PART_PATTERN.find(text))
        .map(|m| m.as_str().to_string())
}

/// An appointment type mention
pub fn extract_appointment_type(text: &str) -> Option<String> {
    APPOINTMENT_TYPE_PATTERN
        .find(text)
        .map(|m| m.as_str().to_lowercase())
}

/// True when the utterance reads as a time expression, for the state
/// machine's direct-answer fallback at a `_TIME` stage.
pub fn looks_like_time(text: &str) -> bool {
    CLOCK_TIME_PATTERN.is_match(text) || DAY_PART_PATTERN.is_match(text)
}

/// True when the utterance reads as a date expression.
pub fn looks_like_date(text: &str) -> bool {
    DATE_PATTERN.is_match(text)
}
