//! Prompt construction for the classifier and drafter calls.
//!
//! Each call applies its own body bound on top of the stored message.

use super::policy::{Tone, guidelines};
use super::types::{Classification, Message, truncate_chars};

/// Build the classification prompt.
pub fn build_classification_prompt(message: &Message, body_chars: usize) -> String {
    format!(
        "Analyze and classify this email.\n\n\
         From: {from}\n\
         Subject: {subject}\n\
         Body: {body}\n\n\
         Provide exactly these lines:\n\
         CATEGORY: [urgent/spam/customer_support/general_inquiry/internal/promotional]\n\
         PRIORITY: [high/medium/low]\n\
         SENTIMENT: [positive/neutral/negative]\n\
         NEEDS_REPLY: [yes/no]\n\
         REASON: [brief explanation]\n",
        from = message.sender(),
        subject = message.subject(),
        body = truncate_chars(message.body(), body_chars),
    )
}

/// Build the reply-drafting prompt.
pub fn build_draft_prompt(
    message: &Message,
    classification: &Classification,
    tone: Tone,
    body_chars: usize,
) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Draft a professional email response.\n\nOriginal:\n");
    prompt.push_str(&format!("From: {}\n", message.sender()));
    prompt.push_str(&format!("Subject: {}\n", message.subject()));
    prompt.push_str(&format!(
        "Body: {}\n\n",
        truncate_chars(message.body(), body_chars)
    ));
    prompt.push_str(&format!(
        "Context: {} | {} priority | {} sentiment\n\n",
        classification.category, classification.priority, classification.sentiment
    ));

    prompt.push_str("Guidelines:\n");
    for line in guidelines(classification.category) {
        prompt.push_str(&format!("- {line}\n"));
    }

    prompt.push_str("\nRequirements:\n");
    prompt.push_str(&format!("- Tone: {}\n", tone.describe()));
    prompt.push_str(
        "- 2-3 short paragraphs\n\
         - Include greeting and closing\n\
         - Just the email body, no subject line\n\n\
         Draft:\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::types::{Category, Priority};

    fn message(body: &str) -> Message {
        Message::new("m1", "Alice <alice@example.com>", "Refund", body)
    }

    #[test]
    fn classification_prompt_lists_fields() {
        let prompt = build_classification_prompt(&message("where is my refund"), 800);
        for label in ["CATEGORY:", "PRIORITY:", "SENTIMENT:", "NEEDS_REPLY:", "REASON:"] {
            assert!(prompt.contains(label), "missing {label}");
        }
        assert!(prompt.contains("Alice <alice@example.com>"));
        assert!(prompt.contains("where is my refund"));
    }

    #[test]
    fn classification_prompt_truncates_body() {
        let body = format!("{}{}", "a".repeat(800), "TAIL");
        let prompt = build_classification_prompt(&message(&body), 800);
        assert!(!prompt.contains("TAIL"));
    }

    #[test]
    fn draft_prompt_carries_tone_and_guidelines() {
        let classification = Classification {
            category: Category::Urgent,
            priority: Priority::High,
            ..Classification::default()
        };
        let body = format!("{}{}", "b".repeat(600), "TAIL");
        let prompt = build_draft_prompt(&message(&body), &classification, Tone::Urgent, 600);
        assert!(prompt.contains("immediate and solution-focused"));
        assert!(prompt.contains("Acknowledge the urgency"));
        assert!(prompt.contains("urgent | high priority"));
        assert!(!prompt.contains("TAIL"));
    }
}
