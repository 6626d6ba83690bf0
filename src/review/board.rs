//! Review board: the human-in-the-loop state machine over a run's entries.
//!
//! Transitions:
//! - `pending → approved_sent`: replyable entry, non-empty draft, and the
//!   gateway send succeeds. A failed send leaves the entry pending with
//!   `dispatch_error` set.
//! - `pending → rejected`: always allowed, no external call.
//!
//! Drafts can be edited only while pending. Concurrent editors are not
//! coordinated: the last edit wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::dispatch::{DispatchGateway, reply_subject};
use crate::error::{DispatchError, WorkflowError};
use crate::pipeline::summary::BatchResult;

use super::model::{ReviewEntry, ReviewEvent, ReviewStatus};

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Ordered, id-unique collection of review entries with event fan-out.
pub struct ReviewBoard {
    entries: RwLock<Vec<ReviewEntry>>,
    tx: broadcast::Sender<ReviewEvent>,
}

impl ReviewBoard {
    /// Create an empty board.
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            entries: RwLock::new(Vec::new()),
            tx,
        })
    }

    /// Subscribe to board events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReviewEvent> {
        self.tx.subscribe()
    }

    /// Add an entry. Returns `false` (and drops the entry) when an entry with
    /// the same id already exists.
    pub async fn insert(&self, entry: ReviewEntry) -> bool {
        let id = entry.id().to_string();
        {
            let mut entries = self.entries.write().await;
            if entries.iter().any(|e| e.id() == id) {
                debug!(id = %id, "Entry already on board, not adding duplicate");
                return false;
            }
            info!(
                id = %id,
                sender = %entry.message.sender(),
                category = entry.category().map(|c| c.label()).unwrap_or("none"),
                has_draft = entry.has_draft(),
                "Review entry added"
            );
            entries.push(entry);
        }

        // Broadcast: ok if no receivers are listening
        let _ = self.tx.send(ReviewEvent::EntryAdded { id });
        true
    }

    /// Is there an entry with this id?
    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.iter().any(|e| e.id() == id)
    }

    /// Snapshot of one entry.
    pub async fn get(&self, id: &str) -> Option<ReviewEntry> {
        self.entries.read().await.iter().find(|e| e.id() == id).cloned()
    }

    /// Snapshot of all entries, in insertion order.
    pub async fn entries(&self) -> Vec<ReviewEntry> {
        self.entries.read().await.clone()
    }

    /// Entries still awaiting the operator.
    pub async fn pending(&self) -> Vec<ReviewEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.status == ReviewStatus::Pending)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Aggregate counts over the board as it stands now.
    pub async fn summary(&self) -> BatchResult {
        BatchResult::from_entries(&self.entries.read().await, 0)
    }

    /// Replace the operator's edited draft. Status is unchanged.
    pub async fn edit(&self, id: &str, text: impl Into<String>) -> Result<ReviewEntry, WorkflowError> {
        let mut entries = self.entries.write().await;
        let entry = find_mut(&mut entries, id)?;

        ensure_pending(entry, ReviewStatus::Pending)?;
        if !entry.replyable {
            return Err(WorkflowError::NotReplyable { id: id.to_string() });
        }

        entry.edited_draft = Some(text.into());
        entry.updated_at = Utc::now();
        let edited = entry.clone();
        drop(entries);

        info!(id = %id, "Draft edited");
        let _ = self.tx.send(ReviewEvent::DraftEdited { id: id.to_string() });
        Ok(edited)
    }

    /// Reject (or mark reviewed) a pending entry.
    pub async fn reject(&self, id: &str) -> Result<ReviewEntry, WorkflowError> {
        let mut entries = self.entries.write().await;
        let entry = find_mut(&mut entries, id)?;

        ensure_pending(entry, ReviewStatus::Rejected)?;
        entry.status = ReviewStatus::Rejected;
        entry.updated_at = Utc::now();
        let rejected = entry.clone();
        drop(entries);

        info!(id = %id, "Entry rejected");
        let _ = self.tx.send(ReviewEvent::StatusChanged {
            id: id.to_string(),
            status: ReviewStatus::Rejected,
        });
        Ok(rejected)
    }

    /// Approve a pending entry and dispatch its draft.
    ///
    /// The board stays locked for the duration of the send so the entry
    /// cannot change underneath it. On dispatch failure the entry remains
    /// pending, the reason is recorded, and `DispatchFailed` is returned; the
    /// operator may simply approve again.
    pub async fn approve(
        &self,
        id: &str,
        gateway: &dyn DispatchGateway,
        timeout: Duration,
    ) -> Result<ReviewEntry, WorkflowError> {
        let mut entries = self.entries.write().await;
        let entry = find_mut(&mut entries, id)?;

        ensure_pending(entry, ReviewStatus::ApprovedSent)?;
        if !entry.replyable {
            warn!(id = %id, "Cannot approve an entry that takes no reply");
            return Err(WorkflowError::NotReplyable { id: id.to_string() });
        }
        let Some(body) = entry.current_draft().map(str::to_string) else {
            return Err(WorkflowError::NoDraft { id: id.to_string() });
        };

        let to = entry.message.reply_address().to_string();
        let subject = reply_subject(entry.message.subject());

        let outcome = match tokio::time::timeout(timeout, gateway.send(&to, &subject, &body)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout { timeout }),
        };

        match outcome {
            Ok(()) => {
                let now = Utc::now();
                entry.status = ReviewStatus::ApprovedSent;
                entry.dispatch_error = None;
                entry.sent_at = Some(now);
                entry.updated_at = now;
                let sent = entry.clone();
                drop(entries);

                info!(id = %id, to = %to, gateway = gateway.name(), "Entry approved and sent");
                let _ = self.tx.send(ReviewEvent::StatusChanged {
                    id: id.to_string(),
                    status: ReviewStatus::ApprovedSent,
                });
                Ok(sent)
            }
            Err(e) => {
                let reason = e.to_string();
                entry.dispatch_error = Some(reason.clone());
                entry.updated_at = Utc::now();
                drop(entries);

                warn!(id = %id, error = %reason, "Dispatch failed, entry left pending");
                let _ = self.tx.send(ReviewEvent::DispatchFailed {
                    id: id.to_string(),
                    reason,
                });
                Err(WorkflowError::DispatchFailed {
                    id: id.to_string(),
                    source: e,
                })
            }
        }
    }
}

fn find_mut<'a>(entries: &'a mut [ReviewEntry], id: &str) -> Result<&'a mut ReviewEntry, WorkflowError> {
    entries
        .iter_mut()
        .find(|e| e.id() == id)
        .ok_or_else(|| WorkflowError::NotFound { id: id.to_string() })
}

fn ensure_pending(entry: &ReviewEntry, target: ReviewStatus) -> Result<(), WorkflowError> {
    if entry.status.is_terminal() {
        return Err(WorkflowError::InvalidTransition {
            id: entry.id().to_string(),
            state: entry.status.label().to_string(),
            target: target.label().to_string(),
        });
    }
    Ok(())
}
