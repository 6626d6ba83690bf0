//! Review entry data model: statuses, failures, and board events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::triage::policy::{ResponseDecision, Tone};
use crate::triage::types::{Category, Classification, Message};

/// Lifecycle of a review entry.
///
/// `Pending` is the only non-terminal state. There is no edge back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Waiting for the operator.
    Pending,
    /// Approved and successfully dispatched.
    ApprovedSent,
    /// Rejected, or marked reviewed.
    Rejected,
}

impl ReviewStatus {
    /// Disposition label used in reports and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ApprovedSent => "sent",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an entry did not make it through the pipeline cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "reason", rename_all = "snake_case")]
pub enum EntryFailure {
    /// The raw message could not be turned into a `Message`.
    Extraction(String),
    /// The classifier call failed; there is no classification.
    Classifier(String),
    /// The drafter call failed; there is no original draft.
    Draft(String),
}

impl EntryFailure {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extraction",
            Self::Classifier(_) => "classifier",
            Self::Draft(_) => "draft",
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Extraction(r) | Self::Classifier(r) | Self::Draft(r) => r,
        }
    }
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.label(), self.reason())
    }
}

/// One message's review state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// The extracted message (a placeholder when extraction failed).
    pub message: Message,
    /// `None` when the classifier call failed or never ran.
    pub classification: Option<Classification>,
    /// Tone chosen by the response policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    /// Draft as produced by the drafter. Never modified.
    pub original_draft: Option<String>,
    /// Operator's edited copy.
    pub edited_draft: Option<String>,
    pub status: ReviewStatus,
    /// False for spam / no-reply / unextractable entries: these can only be
    /// rejected ("marked reviewed") or left pending.
    pub replyable: bool,
    /// Flagged for human attention: urgent, customer-support or
    /// high-priority mail, and entries the classifier never labelled.
    #[serde(default)]
    pub needs_review: bool,
    /// Pipeline failure marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<EntryFailure>,
    /// Last dispatch failure, cleared on a successful send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl ReviewEntry {
    /// Create a pending entry for a message.
    pub fn new(message: Message) -> Self {
        let now = Utc::now();
        Self {
            message,
            classification: None,
            tone: None,
            original_draft: None,
            edited_draft: None,
            status: ReviewStatus::Pending,
            replyable: true,
            needs_review: false,
            failure: None,
            dispatch_error: None,
            created_at: now,
            updated_at: now,
            sent_at: None,
        }
    }

    /// Attach the classification and the policy decision derived from it.
    pub fn with_classification(
        mut self,
        classification: Classification,
        decision: ResponseDecision,
    ) -> Self {
        self.classification = Some(classification);
        self.tone = Some(decision.tone);
        self.replyable = decision.should_draft;
        self.needs_review = decision.needs_review;
        self
    }

    /// Set the AI-generated draft.
    pub fn with_draft(mut self, draft: impl Into<String>) -> Self {
        let draft = draft.into();
        self.original_draft = (!draft.trim().is_empty()).then_some(draft);
        self
    }

    /// Mark a pipeline failure. Extraction failures are never replyable.
    /// Entries left without a classification are flagged for review.
    pub fn with_failure(mut self, failure: EntryFailure) -> Self {
        if matches!(failure, EntryFailure::Extraction(_)) {
            self.replyable = false;
        }
        if self.classification.is_none() {
            self.needs_review = true;
        }
        self.failure = Some(failure);
        self
    }

    /// Entry id (the message id).
    pub fn id(&self) -> &str {
        self.message.id()
    }

    /// Text that would be sent: the edited copy if non-empty, else the
    /// original draft if non-empty.
    pub fn current_draft(&self) -> Option<&str> {
        self.edited_draft
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.original_draft.as_deref().filter(|d| !d.trim().is_empty()))
    }

    pub fn has_draft(&self) -> bool {
        self.current_draft().is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Category, if classified.
    pub fn category(&self) -> Option<Category> {
        self.classification.as_ref().map(|c| c.category)
    }
}

/// Events broadcast by the review board.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    /// A new entry was added.
    EntryAdded { id: String },
    /// The operator edited a draft.
    DraftEdited { id: String },
    /// An entry reached a terminal status.
    StatusChanged { id: String, status: ReviewStatus },
    /// Dispatch failed; the entry is still pending.
    DispatchFailed { id: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::policy::decide;

    fn spam() -> Classification {
        Classification {
            category: Category::Spam,
            ..Classification::default()
        }
    }

    #[test]
    fn new_entry_is_pending_without_draft() {
        let entry = ReviewEntry::new(Message::placeholder("m1"));
        assert_eq!(entry.status, ReviewStatus::Pending);
        assert_eq!(entry.id(), "m1");
        assert!(!entry.has_draft());
        assert!(entry.replyable);
    }

    #[test]
    fn spam_classification_is_not_replyable() {
        let c = spam();
        let decision = decide(&c);
        let entry = ReviewEntry::new(Message::placeholder("m1")).with_classification(c, decision);
        assert!(!entry.replyable);
        assert_eq!(entry.category(), Some(Category::Spam));
    }

    #[test]
    fn blank_draft_is_treated_as_none() {
        let entry = ReviewEntry::new(Message::placeholder("m1")).with_draft("  \n");
        assert!(entry.original_draft.is_none());
    }

    #[test]
    fn edited_draft_takes_precedence_unless_blank() {
        let mut entry = ReviewEntry::new(Message::placeholder("m1")).with_draft("original");
        assert_eq!(entry.current_draft(), Some("original"));

        entry.edited_draft = Some("edited".into());
        assert_eq!(entry.current_draft(), Some("edited"));

        entry.edited_draft = Some("   ".into());
        assert_eq!(entry.current_draft(), Some("original"));
    }

    #[test]
    fn extraction_failure_is_not_replyable() {
        let entry = ReviewEntry::new(Message::placeholder("m1"))
            .with_failure(EntryFailure::Extraction("empty".into()));
        assert!(!entry.replyable);
        assert!(entry.is_failed());
    }

    #[test]
    fn classifier_failure_stays_replyable() {
        let entry = ReviewEntry::new(Message::placeholder("m1"))
            .with_failure(EntryFailure::Classifier("timeout".into()));
        assert!(entry.replyable);
        assert!(entry.classification.is_none());
    }

    #[test]
    fn review_flag_follows_decision_and_survives_draft_failure() {
        let c = Classification {
            category: Category::CustomerSupport,
            ..Classification::default()
        };
        let decision = decide(&c);
        let entry = ReviewEntry::new(Message::placeholder("m1"))
            .with_classification(c, decision)
            .with_failure(EntryFailure::Draft("rate limited".into()));
        assert!(entry.needs_review);

        let c = Classification::default();
        let decision = decide(&c);
        let entry = ReviewEntry::new(Message::placeholder("m2"))
            .with_classification(c, decision)
            .with_failure(EntryFailure::Draft("rate limited".into()));
        assert!(!entry.needs_review);
    }

    #[test]
    fn unclassified_failures_need_review() {
        let entry = ReviewEntry::new(Message::placeholder("m1"))
            .with_failure(EntryFailure::Classifier("timeout".into()));
        assert!(entry.needs_review);
        assert!(!ReviewEntry::new(Message::placeholder("m2")).needs_review);
    }

    #[test]
    fn status_labels() {
        assert_eq!(ReviewStatus::Pending.label(), "pending");
        assert_eq!(ReviewStatus::ApprovedSent.label(), "sent");
        assert_eq!(ReviewStatus::Rejected.label(), "rejected");
        assert!(!ReviewStatus::Pending.is_terminal());
        assert!(ReviewStatus::Rejected.is_terminal());
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = ReviewEvent::StatusChanged {
            id: "m1".into(),
            status: ReviewStatus::ApprovedSent,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["status"], "approved_sent");
    }

    #[test]
    fn failure_serializes_stage_and_reason() {
        let json = serde_json::to_value(EntryFailure::Draft("boom".into())).unwrap();
        assert_eq!(json["stage"], "draft");
        assert_eq!(json["reason"], "boom");
    }
}
