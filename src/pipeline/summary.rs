//! Batch summary: counts over a set of review entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::model::{ReviewEntry, ReviewStatus};
use crate::triage::types::{Category, Priority, Sentiment};

/// Aggregate over the entries of one run. Built once, never updated;
/// take a fresh one from `ReviewBoard::summary` to see later dispositions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Entries produced (failed ones included).
    pub total: usize,
    /// Entries with a classification.
    pub classified: usize,
    /// Entries carrying a draft.
    pub drafted: usize,
    /// Entries with a pipeline failure marker.
    pub failed: usize,
    /// Entries flagged for human review.
    #[serde(default)]
    pub needs_review: usize,
    /// Inputs skipped because their id was already present.
    pub skipped_duplicates: usize,
    pub by_category: Vec<(Category, usize)>,
    pub by_priority: Vec<(Priority, usize)>,
    pub by_sentiment: Vec<(Sentiment, usize)>,
    pub pending: usize,
    pub sent: usize,
    pub rejected: usize,
    pub completed_at: DateTime<Utc>,
}

impl BatchResult {
    /// Count a slice of entries.
    pub fn from_entries(entries: &[ReviewEntry], skipped_duplicates: usize) -> Self {
        let classifications: Vec<_> = entries
            .iter()
            .filter_map(|e| e.classification.as_ref())
            .collect();

        let by_category = Category::ALL
            .iter()
            .map(|c| (*c, classifications.iter().filter(|x| x.category == *c).count()))
            .collect();
        let by_priority = Priority::ALL
            .iter()
            .map(|p| (*p, classifications.iter().filter(|x| x.priority == *p).count()))
            .collect();
        let by_sentiment = Sentiment::ALL
            .iter()
            .map(|s| (*s, classifications.iter().filter(|x| x.sentiment == *s).count()))
            .collect();

        let status_count =
            |status: ReviewStatus| entries.iter().filter(|e| e.status == status).count();

        Self {
            total: entries.len(),
            classified: classifications.len(),
            drafted: entries.iter().filter(|e| e.has_draft()).count(),
            failed: entries.iter().filter(|e| e.is_failed()).count(),
            needs_review: entries.iter().filter(|e| e.needs_review).count(),
            skipped_duplicates,
            by_category,
            by_priority,
            by_sentiment,
            pending: status_count(ReviewStatus::Pending),
            sent: status_count(ReviewStatus::ApprovedSent),
            rejected: status_count(ReviewStatus::Rejected),
            completed_at: Utc::now(),
        }
    }

    pub fn category_count(&self, category: Category) -> usize {
        lookup(&self.by_category, category)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        lookup(&self.by_priority, priority)
    }

    pub fn sentiment_count(&self, sentiment: Sentiment) -> usize {
        lookup(&self.by_sentiment, sentiment)
    }

    /// Plain-text report. Zero rows are left out.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Total processed:   {}\n", self.total));
        out.push_str(&format!("Drafts produced:   {}\n", self.drafted));
        out.push_str(&format!("Failed:            {}\n", self.failed));
        out.push_str(&format!("Needs review:      {}\n", self.needs_review));
        if self.skipped_duplicates > 0 {
            out.push_str(&format!("Skipped (dupes):   {}\n", self.skipped_duplicates));
        }

        render_section(&mut out, "By category", &self.by_category);
        render_section(&mut out, "By priority", &self.by_priority);
        render_section(&mut out, "By sentiment", &self.by_sentiment);

        out.push_str("\nBy disposition:\n");
        out.push_str(&format!("  {:<20} {}\n", "pending", self.pending));
        out.push_str(&format!("  {:<20} {}\n", "sent", self.sent));
        out.push_str(&format!("  {:<20} {}\n", "rejected", self.rejected));
        out
    }
}

fn lookup<T: PartialEq + Copy>(rows: &[(T, usize)], key: T) -> usize {
    rows.iter()
        .find(|(k, _)| *k == key)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}

fn render_section<T: std::fmt::Display>(out: &mut String, title: &str, rows: &[(T, usize)]) {
    out.push_str(&format!("\n{title}:\n"));
    for (key, count) in rows.iter().filter(|(_, n)| *n > 0) {
        out.push_str(&format!("  {:<20} {}\n", key.to_string(), count));
    }
}
