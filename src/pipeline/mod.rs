//! Batch pipeline.
//!
//! 1. `MessageSource::fetch_unread_messages()`: source-specific I/O
//! 2. `BatchOrchestrator::process_batch()`: extract, classify, decide, draft
//! 3. Entries land on the `ReviewBoard` for the operator
//!
//! **No auto-reply path exists.** Nothing is sent until the operator approves.

pub mod orchestrator;
pub mod source;
pub mod summary;

pub use orchestrator::{BatchOrchestrator, BatchReport};
pub use source::{DirectorySource, MessageSource};
pub use summary::BatchResult;
