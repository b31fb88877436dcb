//! Text processing for the clinic call assistant
//!
//! Regex-cascade intent classification and entity extraction over caller
//! utterances. The dialogue core consumes this only through the
//! `EntityExtractor` trait; its own tests mock the trait with literal
//! fixtures, so nothing here is part of the core contract.

pub mod entities;
pub mod intent;

mod extractor;

pub use extractor::RegexExtractor;
pub use intent::{detect_intent, is_faq};
