//! Response policy: whether to draft, and in what tone.

use serde::{Deserialize, Serialize};

use super::types::{Category, Classification, Priority, Sentiment};

/// Tone requested from the drafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// High-priority mail: immediate and solution-focused.
    Urgent,
    /// Unhappy sender: empathetic and reassuring.
    Empathetic,
    /// Everything else: professional and helpful.
    Professional,
}

impl Tone {
    /// Phrase used in the draft prompt.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Urgent => "immediate and solution-focused",
            Self::Empathetic => "empathetic and reassuring",
            Self::Professional => "professional and helpful",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Outcome of the policy for one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseDecision {
    pub should_draft: bool,
    pub tone: Tone,
    /// Urgent, customer-support or high-priority mail: a human should look
    /// at it first regardless of the draft.
    pub needs_review: bool,
}

/// Decide whether a reply is drafted, which tone it takes, and whether the
/// message is flagged for human review.
///
/// Spam and "no reply needed" never get a draft. Tone precedence:
/// high priority, then negative sentiment, then the professional default.
pub fn decide(classification: &Classification) -> ResponseDecision {
    let should_draft = classification.category != Category::Spam && classification.needs_reply;

    let tone = if classification.priority == Priority::High {
        Tone::Urgent
    } else if classification.sentiment == Sentiment::Negative {
        Tone::Empathetic
    } else {
        Tone::Professional
    };

    let needs_review = matches!(
        classification.category,
        Category::Urgent | Category::CustomerSupport
    ) || classification.priority == Priority::High;

    ResponseDecision {
        should_draft,
        tone,
        needs_review,
    }
}

/// Category-specific bullet points for the drafter.
pub fn guidelines(category: Category) -> &'static [&'static str] {
    match category {
        Category::Urgent => &[
            "Acknowledge the urgency immediately",
            "Apologize for the inconvenience",
            "Provide immediate next steps",
            "Give a specific timeline (e.g. \"within 1 hour\")",
        ],
        Category::CustomerSupport => &[
            "Be empathetic and understanding",
            "Acknowledge their issue",
            "Provide a clear solution or next steps",
            "Offer additional help if needed",
        ],
        _ => &[
            "Be friendly and professional",
            "Provide helpful information",
            "Offer to answer additional questions",
        ],
    }
}
