//! Inbox Triage: batch email classification and drafting with operator review.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod llm;
pub mod pipeline;
pub mod review;
pub mod triage;
