//! Classifier response parsing.
//!
//! The classifier is asked for `CATEGORY:` / `PRIORITY:` / `SENTIMENT:` /
//! `NEEDS_REPLY:` / `REASON:` lines but nothing guarantees it complies.
//! Parsing is a single line-by-line scan:
//!
//! - a line is attributed to the leftmost field label it contains;
//! - the text after the label is matched against that field's ordered
//!   keyword list, first hit wins;
//! - a later line for the same field overwrites an earlier one;
//! - fields never mentioned keep their `Classification::default()` value.
//!
//! Parsing never fails.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::types::{Category, Classification, Priority, Sentiment};

static FIELD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(category|priority|sentiment|needs[\s_-]?reply|reason)[*_\s]*:").unwrap()
});

/// Category keywords in tie-break order.
const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    ("urgent", Category::Urgent),
    ("spam", Category::Spam),
    ("promotional", Category::Spam),
    ("customer", Category::CustomerSupport),
    ("support", Category::CustomerSupport),
    ("internal", Category::Internal),
    ("general", Category::GeneralInquiry),
    ("inquiry", Category::GeneralInquiry),
];

const PRIORITY_KEYWORDS: &[(&str, Priority)] = &[
    ("high", Priority::High),
    ("low", Priority::Low),
    ("medium", Priority::Medium),
];

const SENTIMENT_KEYWORDS: &[(&str, Sentiment)] = &[
    ("positive", Sentiment::Positive),
    ("negative", Sentiment::Negative),
    ("neutral", Sentiment::Neutral),
];

/// Matched as whole words so "none"/"unknown" don't read as "no".
const NEEDS_REPLY_WORDS: &[(&str, bool)] = &[
    ("yes", true),
    ("true", true),
    ("no", false),
    ("false", false),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Category,
    Priority,
    Sentiment,
    NeedsReply,
    Reason,
}

impl Field {
    fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.starts_with("category") {
            Self::Category
        } else if label.starts_with("priority") {
            Self::Priority
        } else if label.starts_with("sentiment") {
            Self::Sentiment
        } else if label.starts_with("needs") {
            Self::NeedsReply
        } else {
            Self::Reason
        }
    }
}

/// Parse free-text classifier output into a `Classification`.
pub fn parse_classification(text: &str) -> Classification {
    let mut result = Classification::default();

    for line in text.lines() {
        let Some(caps) = FIELD_LABEL.captures(line) else {
            continue;
        };
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = &line[whole.end()..];
        let lowered = value.to_lowercase();

        match Field::from_label(label.as_str()) {
            Field::Category => {
                if let Some(category) = first_substring_match(&lowered, CATEGORY_KEYWORDS) {
                    result.category = category;
                }
            }
            Field::Priority => {
                if let Some(priority) = first_substring_match(&lowered, PRIORITY_KEYWORDS) {
                    result.priority = priority;
                }
            }
            Field::Sentiment => {
                if let Some(sentiment) = first_substring_match(&lowered, SENTIMENT_KEYWORDS) {
                    result.sentiment = sentiment;
                }
            }
            Field::NeedsReply => {
                if let Some(needs_reply) = first_word_match(&lowered, NEEDS_REPLY_WORDS) {
                    result.needs_reply = needs_reply;
                }
            }
            Field::Reason => {
                let reason = value.trim_matches(|c: char| c == '*' || c.is_whitespace());
                if !reason.is_empty() {
                    result.reason = Some(reason.to_string());
                }
            }
        }
    }

    debug!(
        category = %result.category,
        priority = %result.priority,
        sentiment = %result.sentiment,
        needs_reply = result.needs_reply,
        "Parsed classification"
    );
    result
}

fn first_substring_match<T: Copy>(value: &str, candidates: &[(&str, T)]) -> Option<T> {
    candidates
        .iter()
        .find(|(keyword, _)| value.contains(keyword))
        .map(|(_, v)| *v)
}

fn first_word_match<T: Copy>(value: &str, candidates: &[(&str, T)]) -> Option<T> {
    let words: Vec<&str> = value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    candidates
        .iter()
        .find(|(keyword, _)| words.contains(keyword))
        .map(|(_, v)| *v)
}
