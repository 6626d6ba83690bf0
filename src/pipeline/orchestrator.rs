//! Batch orchestrator: drives each message through the triage steps and
//! adds one review entry per message to the board.
//!
//! Per message:
//! 1. `FieldExtractor::extract()`: raw bytes → `Message`
//! 2. Classifier call → `parse_classification()`
//! 3. `decide()`: spam / no-reply entries stop here
//! 4. Drafter call → original draft
//!
//! A failure at any step marks that entry and moves on. Only the source
//! failing aborts the run.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::TriageConfig;
use crate::error::SourceError;
use crate::llm::{LlmProvider, complete_with_timeout};
use crate::review::board::ReviewBoard;
use crate::review::model::{EntryFailure, ReviewEntry};
use crate::triage::extract::FieldExtractor;
use crate::triage::parser::parse_classification;
use crate::triage::policy::decide;
use crate::triage::prompts::{build_classification_prompt, build_draft_prompt};
use crate::triage::types::{Message, RawMessage};

use super::source::MessageSource;
use super::summary::BatchResult;

/// What one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Counts over the entries added in this run.
    pub result: BatchResult,
    /// Entries added in this run, in input order.
    pub entries: Vec<ReviewEntry>,
    /// Input ids skipped because an entry with that id already existed.
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Ids that went through without a failure marker. These are safe to
    /// acknowledge at the source.
    pub fn completed_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.is_failed())
            .map(|e| e.id().to_string())
            .collect()
    }
}

/// Runs a batch of messages through extraction, classification, policy and
/// drafting.
pub struct BatchOrchestrator {
    extractor: FieldExtractor,
    classifier: Arc<dyn LlmProvider>,
    drafter: Arc<dyn LlmProvider>,
    config: TriageConfig,
}

impl BatchOrchestrator {
    pub fn new(
        classifier: Arc<dyn LlmProvider>,
        drafter: Arc<dyn LlmProvider>,
        config: TriageConfig,
    ) -> Self {
        Self {
            extractor: FieldExtractor::new(config.stored_body_chars),
            classifier,
            drafter,
            config,
        }
    }

    /// Fetch up to `max_messages` from the source and process them.
    ///
    /// Returns an error only when the source itself fails.
    pub async fn run(
        &self,
        source: &dyn MessageSource,
        board: &ReviewBoard,
    ) -> Result<BatchReport, SourceError> {
        let raws = source
            .fetch_unread_messages(self.config.max_messages)
            .await
            .map_err(|e| {
                error!(source = source.name(), error = %e, "Message source failed, aborting batch");
                e
            })?;

        Ok(self.process_batch(raws, board).await)
    }

    /// Process already-fetched messages. Entries land on the board in input
    /// order; ids already on the board (or repeated in the input) are skipped.
    pub async fn process_batch(&self, raws: Vec<RawMessage>, board: &ReviewBoard) -> BatchReport {
        let count = raws.len();
        info!(count, concurrency = self.config.concurrency, "Processing message batch");

        let mut seen = HashSet::new();
        let mut skipped = Vec::new();
        let mut fresh = Vec::with_capacity(count);
        for raw in raws.into_iter().take(self.config.max_messages) {
            if !raw.id.trim().is_empty() && (board.contains(&raw.id).await || !seen.insert(raw.id.clone())) {
                debug!(id = %raw.id, "Message already processed, skipping");
                skipped.push(raw.id);
                continue;
            }
            fresh.push(raw);
        }

        let processed: Vec<ReviewEntry> = futures::stream::iter(fresh)
            .map(|raw| self.process_one(raw))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut entries = Vec::with_capacity(processed.len());
        for entry in processed {
            let id = entry.id().to_string();
            if board.insert(entry.clone()).await {
                entries.push(entry);
            } else {
                skipped.push(id);
            }
        }

        let result = BatchResult::from_entries(&entries, skipped.len());
        info!(
            total = result.total,
            drafted = result.drafted,
            failed = result.failed,
            skipped = result.skipped_duplicates,
            "Batch processing complete"
        );

        BatchReport {
            result,
            entries,
            skipped,
        }
    }

    /// Turn one raw message into a review entry. Never fails: problems are
    /// recorded on the entry.
    async fn process_one(&self, raw: RawMessage) -> ReviewEntry {
        let message = match self.extractor.extract(&raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(id = %raw.id, error = %e, "Extraction failed");
                let id = if raw.id.trim().is_empty() {
                    Uuid::new_v4().to_string()
                } else {
                    raw.id
                };
                return ReviewEntry::new(Message::placeholder(id))
                    .with_failure(EntryFailure::Extraction(e.to_string()));
            }
        };

        debug!(
            id = %message.id(),
            sender = %message.sender(),
            subject = %message.subject(),
            "Classifying message"
        );

        let prompt = build_classification_prompt(&message, self.config.classify_body_chars);
        let response =
            match complete_with_timeout(self.classifier.as_ref(), &prompt, self.config.call_timeout)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(id = %message.id(), error = %e, "Classifier call failed");
                    return ReviewEntry::new(message)
                        .with_failure(EntryFailure::Classifier(e.to_string()));
                }
            };

        let classification = parse_classification(&response);
        let decision = decide(&classification);
        debug!(
            id = %message.id(),
            category = classification.category.label(),
            priority = classification.priority.label(),
            sentiment = classification.sentiment.label(),
            should_draft = decision.should_draft,
            "Message classified"
        );

        if !decision.should_draft {
            return ReviewEntry::new(message).with_classification(classification, decision);
        }

        let prompt = build_draft_prompt(
            &message,
            &classification,
            decision.tone,
            self.config.draft_body_chars,
        );
        let entry = ReviewEntry::new(message).with_classification(classification, decision);

        match complete_with_timeout(self.drafter.as_ref(), &prompt, self.config.call_timeout).await {
            Ok(draft) => entry.with_draft(draft.trim()),
            Err(e) => {
                warn!(id = %entry.id(), error = %e, "Drafter call failed");
                entry.with_failure(EntryFailure::Draft(e.to_string()))
            }
        }
    }
}
