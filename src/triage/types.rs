//! Shared types for the triage pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Raw message ─────────────────────────────────────────────────────

/// A message as handed over by a `MessageSource`: a stable id plus the
/// undecoded RFC 822 bytes.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Source-stable id (file name, IMAP UID, ...).
    pub id: String,
    /// Full message bytes, headers and body.
    pub data: Vec<u8>,
}

impl RawMessage {
    pub fn new(id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }

    /// Header block (everything before the first blank line).
    pub fn raw_headers(&self) -> &[u8] {
        &self.data[..self.header_end().0]
    }

    /// Body payload (everything after the first blank line). May be multi-part.
    pub fn raw_body(&self) -> &[u8] {
        &self.data[self.header_end().1..]
    }

    /// (end of headers, start of body). A message without a blank line is
    /// all headers.
    fn header_end(&self) -> (usize, usize) {
        let data = &self.data;
        for i in 0..data.len() {
            if data[i..].starts_with(b"\r\n\r\n") {
                return (i, i + 4);
            }
            if data[i..].starts_with(b"\n\n") {
                return (i, i + 2);
            }
        }
        (data.len(), data.len())
    }
}

// ── Message ─────────────────────────────────────────────────────────

/// Canonical extracted message. Never mutated after extraction: fields are
/// set through `new` and the `with_*` builders, then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque id (source-provided, or synthesized when the source gave none).
    id: String,
    /// Raw `From` header value, e.g. `"Alice <alice@example.com>"`.
    sender: String,
    /// Bare address parsed from `From`, when one could be found.
    reply_to: Option<String>,
    /// Subject line, `"(No Subject)"` when missing.
    subject: String,
    /// Body text, capped to the stored-body bound.
    body: String,
    /// Date header, or extraction time when absent.
    received_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            reply_to: None,
            subject: subject.into(),
            body: body.into(),
            received_at: Utc::now(),
        }
    }

    pub fn with_reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// Stand-in for a raw message that could not be extracted, so the
    /// failure still has an entry to hang off.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(id, "(unknown)", super::extract::NO_SUBJECT, "")
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Where a reply goes: the parsed address, else the raw sender.
    pub fn reply_address(&self) -> &str {
        self.reply_to.as_deref().unwrap_or(&self.sender)
    }
}

/// First `max_chars` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ── Classification ──────────────────────────────────────────────────

/// Message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Urgent,
    Spam,
    CustomerSupport,
    #[default]
    GeneralInquiry,
    Internal,
    Promotional,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Urgent,
        Self::Spam,
        Self::CustomerSupport,
        Self::GeneralInquiry,
        Self::Internal,
        Self::Promotional,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Spam => "spam",
            Self::CustomerSupport => "customer_support",
            Self::GeneralInquiry => "general_inquiry",
            Self::Internal => "internal",
            Self::Promotional => "promotional",
        }
    }
}

/// Message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Sender sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

macro_rules! display_via_label {
    ($($ty:ty),*) => {$(
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    )*};
}

display_via_label!(Category, Priority, Sentiment);

/// Structured triage decision for one message.
///
/// `Default` is the "don't know" answer: general inquiry, medium priority,
/// neutral, needs a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub priority: Priority,
    pub sentiment: Sentiment,
    pub needs_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            category: Category::default(),
            priority: Priority::default(),
            sentiment: Sentiment::default(),
            needs_reply: true,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_splits_headers_and_body() {
        let raw = RawMessage::new("m1", "From: a@b.c\r\nSubject: hi\r\n\r\nbody text");
        assert_eq!(raw.raw_headers(), b"From: a@b.c\r\nSubject: hi");
        assert_eq!(raw.raw_body(), b"body text");
    }

    #[test]
    fn raw_message_bare_newlines() {
        let raw = RawMessage::new("m1", "Subject: hi\n\nline one\n\nline two");
        assert_eq!(raw.raw_body(), b"line one\n\nline two");
    }

    #[test]
    fn raw_message_without_blank_line_has_empty_body() {
        let raw = RawMessage::new("m1", "Subject: only headers");
        assert!(raw.raw_body().is_empty());
        assert_eq!(raw.raw_headers(), b"Subject: only headers");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn classification_defaults() {
        let c = Classification::default();
        assert_eq!(c.category, Category::GeneralInquiry);
        assert_eq!(c.priority, Priority::Medium);
        assert_eq!(c.sentiment, Sentiment::Neutral);
        assert!(c.needs_reply);
        assert!(c.reason.is_none());
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::CustomerSupport).unwrap();
        assert_eq!(json, "\"customer_support\"");
        assert_eq!(Category::CustomerSupport.to_string(), "customer_support");
    }

    #[test]
    fn reply_address_falls_back_to_sender() {
        let msg = Message::new("x", "Bob <bob@example.com>", "hi", "");
        assert_eq!(msg.reply_address(), "Bob <bob@example.com>");
        let msg = msg.with_reply_to("bob@example.com");
        assert_eq!(msg.reply_address(), "bob@example.com");
        assert_eq!(msg.sender(), "Bob <bob@example.com>");
    }

    #[test]
    fn placeholder_has_fallback_fields() {
        let msg = Message::placeholder("lost");
        assert_eq!(msg.id(), "lost");
        assert_eq!(msg.sender(), "(unknown)");
        assert_eq!(msg.subject(), super::super::extract::NO_SUBJECT);
        assert!(msg.body().is_empty());
        assert!(msg.reply_to().is_none());
    }
}
