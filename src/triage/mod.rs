//! Per-message triage steps.
//!
//! 1. `extract`: raw bytes → `Message`
//! 2. `prompts` + classifier call → free text
//! 3. `parser`: free text → `Classification`
//! 4. `policy`: `Classification` → draft or not, and tone

pub mod extract;
pub mod parser;
pub mod policy;
pub mod prompts;
pub mod types;

pub use extract::FieldExtractor;
pub use parser::parse_classification;
pub use policy::{ResponseDecision, Tone, decide};
pub use types::{Category, Classification, Message, Priority, RawMessage, Sentiment};
