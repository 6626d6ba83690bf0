//! Human-in-the-loop review of triaged messages.

pub mod board;
pub mod console;
pub mod model;

pub use board::ReviewBoard;
pub use console::{ReviewCommand, ReviewConsole, run_console};
pub use model::{EntryFailure, ReviewEntry, ReviewEvent, ReviewStatus};
