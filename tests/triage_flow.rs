//! End-to-end tests: directory source → batch → review board → dispatch.
//!
//! Stub providers stand in for the classifier and drafter; a recording
//! gateway stands in for SMTP. No network access.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use inbox_triage::config::TriageConfig;
use inbox_triage::dispatch::DispatchGateway;
use inbox_triage::error::{DispatchError, LlmError, WorkflowError};
use inbox_triage::export;
use inbox_triage::llm::LlmProvider;
use inbox_triage::pipeline::{BatchOrchestrator, DirectorySource, MessageSource};
use inbox_triage::review::{ReviewBoard, ReviewEvent, ReviewStatus};
use inbox_triage::triage::{Category, Priority};

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Classifier stub keyed on words in the prompt.
struct KeywordClassifier;

#[async_trait]
impl LlmProvider for KeywordClassifier {
    fn model_name(&self) -> &str {
        "keyword-classifier"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if prompt.contains("WIN A PRIZE") {
            Ok("**Category:** Spam\n**Priority:** Low\n**Sentiment:** Positive\n**Needs reply:** No".into())
        } else if prompt.contains("refund") {
            Ok("CATEGORY: customer_support\nPRIORITY: medium\nSENTIMENT: negative\nNEEDS_REPLY: yes\nREASON: unhappy customer".into())
        } else if prompt.contains("garbled") {
            Ok("I'm not sure what to make of this one.".into())
        } else {
            Err(LlmError::RequestFailed {
                provider: "stub".into(),
                reason: "service unavailable".into(),
            })
        }
    }
}

struct EchoDrafter;

#[async_trait]
impl LlmProvider for EchoDrafter {
    fn model_name(&self) -> &str {
        "echo-drafter"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let tone = if prompt.contains("empathetic") { "empathetic" } else { "plain" };
        Ok(format!("Dear customer,\n\nA {tone} reply.\n\nRegards"))
    }
}

/// Fails the first send, then records everything.
#[derive(Default)]
struct FlakyGateway {
    attempts: Mutex<usize>,
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl DispatchGateway for FlakyGateway {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DispatchError> {
        let mut attempts = self.attempts.lock().unwrap();
        *attempts += 1;
        if *attempts == 1 {
            return Err(DispatchError::Transport("connection refused".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.into(), subject.into(), body.into()));
        Ok(())
    }
}

fn write_mail(dir: &Path, name: &str, from: &str, subject: &str, body: &str) {
    let content = format!("From: {from}\r\nSubject: {subject}\r\nDate: Mon, 6 Jan 2025 09:30:00 +0000\r\n\r\n{body}\r\n");
    std::fs::write(dir.join(name), content).unwrap();
}

fn orchestrator() -> BatchOrchestrator {
    BatchOrchestrator::new(
        Arc::new(KeywordClassifier),
        Arc::new(EchoDrafter),
        TriageConfig::default(),
    )
}

fn inbox() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_mail(
        dir.path(),
        "01.eml",
        "Carol <carol@example.com>",
        "Where is my refund?",
        "I asked for a refund two weeks ago.",
    );
    write_mail(dir.path(), "02.eml", "promo@spam.test", "WIN A PRIZE", "Click here.");
    write_mail(dir.path(), "03.eml", "dave@example.com", "Hello", "Just checking in.");
    write_mail(dir.path(), "04.eml", "erin@example.com", "Odd", "garbled text");
    dir
}

#[tokio::test]
async fn batch_then_review_then_dispatch() {
    let dir = inbox();
    let source = DirectorySource::new(dir.path()).with_archive(dir.path().join("processed"));
    let board = ReviewBoard::new();
    let mut events = board.subscribe();

    let report = orchestrator().run(&source, &board).await.unwrap();

    // One entry per message, in file order.
    let ids: Vec<_> = report.entries.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec!["01.eml", "02.eml", "03.eml", "04.eml"]);
    assert_eq!(report.result.total, 4);
    assert_eq!(report.result.classified, 3);
    assert_eq!(report.result.failed, 1);
    assert_eq!(report.result.category_count(Category::CustomerSupport), 1);
    assert_eq!(report.result.category_count(Category::Spam), 1);
    // Unparseable classifier text falls back to the defaults.
    assert_eq!(report.result.category_count(Category::GeneralInquiry), 1);
    assert_eq!(report.result.priority_count(Priority::Medium), 2);
    // The support request and the unclassified entry are flagged.
    assert_eq!(report.result.needs_review, 2);

    let refund = &report.entries[0];
    assert_eq!(refund.current_draft(), Some("Dear customer,\n\nA empathetic reply.\n\nRegards"));

    let spam = &report.entries[1];
    assert!(!spam.replyable);
    assert!(!spam.has_draft());

    let failed = &report.entries[2];
    assert!(failed.classification.is_none());
    assert!(failed.is_failed());
    assert!(refund.needs_review && failed.needs_review);
    assert!(!spam.needs_review && !report.entries[3].needs_review);

    assert!(matches!(events.recv().await.unwrap(), ReviewEvent::EntryAdded { .. }));

    // Failed entries stay in the inbox; the rest are archived.
    source.acknowledge(&report.completed_ids()).await.unwrap();
    assert!(dir.path().join("03.eml").exists());
    assert!(dir.path().join("processed").join("01.eml").exists());
    assert!(!dir.path().join("01.eml").exists());

    // Review.
    let gateway = FlakyGateway::default();
    board.edit("01.eml", "Your refund was issued today.").await.unwrap();

    let err = board.approve("01.eml", &gateway, DISPATCH_TIMEOUT).await.unwrap_err();
    assert!(matches!(err, WorkflowError::DispatchFailed { .. }));
    let entry = board.get("01.eml").await.unwrap();
    assert_eq!(entry.status, ReviewStatus::Pending);
    assert!(entry.dispatch_error.is_some());

    let sent = board.approve("01.eml", &gateway, DISPATCH_TIMEOUT).await.unwrap();
    assert_eq!(sent.status, ReviewStatus::ApprovedSent);
    assert!(sent.dispatch_error.is_none());
    assert_eq!(
        gateway.sent.lock().unwrap().clone(),
        vec![(
            "carol@example.com".to_string(),
            "Re: Where is my refund?".to_string(),
            "Your refund was issued today.".to_string()
        )]
    );

    // Spam can only be marked reviewed.
    assert!(matches!(
        board.approve("02.eml", &gateway, DISPATCH_TIMEOUT).await,
        Err(WorkflowError::NotReplyable { .. })
    ));
    board.reject("02.eml").await.unwrap();

    // The classifier-failed entry gets a hand-written draft and goes out.
    board.edit("03.eml", "Hi Dave, all good here.").await.unwrap();
    board.approve("03.eml", &gateway, DISPATCH_TIMEOUT).await.unwrap();

    // Terminal states are final.
    assert!(matches!(
        board.reject("01.eml").await,
        Err(WorkflowError::InvalidTransition { .. })
    ));

    let summary = board.summary().await;
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.pending, 1);
}

#[tokio::test]
async fn rerun_over_same_inbox_adds_nothing() {
    let dir = inbox();
    let source = DirectorySource::new(dir.path());
    let board = ReviewBoard::new();
    let orchestrator = orchestrator();

    orchestrator.run(&source, &board).await.unwrap();
    let second = orchestrator.run(&source, &board).await.unwrap();

    assert!(second.entries.is_empty());
    assert_eq!(second.skipped.len(), 4);
    assert_eq!(board.len().await, 4);
}

#[tokio::test]
async fn export_after_review() {
    let dir = inbox();
    let out = tempfile::tempdir().unwrap();
    let source = DirectorySource::new(dir.path());
    let board = ReviewBoard::new();

    orchestrator().run(&source, &board).await.unwrap();
    board.reject("02.eml").await.unwrap();

    let entries = board.entries().await;
    let csv_path = out.path().join("triage.csv");
    export::write_csv(&csv_path, &entries).await.unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[2].starts_with("promo@spam.test,WIN A PRIZE,spam,low,positive,false,false,false,rejected,"));

    // Drafts exist for the refund and the general-inquiry fallback only.
    let records = export::write_records(out.path(), &entries).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn missing_inbox_aborts_the_batch() {
    let board = ReviewBoard::new();
    let source = DirectorySource::new("/no/such/inbox");
    assert!(orchestrator().run(&source, &board).await.is_err());
    assert!(board.is_empty().await);
}
