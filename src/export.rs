//! Export of review entries: a CSV table and one plain-text record per draft.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::error::ExportError;
use crate::review::model::ReviewEntry;

/// CSV column order.
pub const CSV_HEADER: [&str; 10] = [
    "sender",
    "subject",
    "category",
    "priority",
    "sentiment",
    "needs_reply",
    "needs_review",
    "has_draft",
    "disposition",
    "timestamp",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Quote a field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(entry: &ReviewEntry) -> String {
    let c = entry.classification.as_ref();
    let fields = [
        entry.message.sender().to_string(),
        entry.message.subject().to_string(),
        c.map(|c| c.category.label()).unwrap_or("").to_string(),
        c.map(|c| c.priority.label()).unwrap_or("").to_string(),
        c.map(|c| c.sentiment.label()).unwrap_or("").to_string(),
        c.map(|c| c.needs_reply.to_string()).unwrap_or_default(),
        entry.needs_review.to_string(),
        entry.has_draft().to_string(),
        entry.status.label().to_string(),
        entry.created_at.format(TIMESTAMP_FORMAT).to_string(),
    ];
    fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",")
}

/// Render entries as CSV, header first. Unclassified entries leave the
/// classification columns empty.
pub fn to_csv(entries: &[ReviewEntry]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for entry in entries {
        out.push_str(&csv_row(entry));
        out.push('\n');
    }
    out
}

/// Plain-text record for one entry: header lines, a blank line, the draft.
pub fn entry_record(entry: &ReviewEntry) -> String {
    let label = |v: Option<&'static str>| v.unwrap_or("unclassified");
    let c = entry.classification.as_ref();
    let needs_reply = c.map(|c| if c.needs_reply { "yes" } else { "no" });

    let mut out = String::new();
    out.push_str(&format!("TO: {}\n", entry.message.reply_address()));
    out.push_str(&format!("RE: {}\n", entry.message.subject()));
    out.push_str(&format!("CLASSIFICATION: {}\n", label(c.map(|c| c.category.label()))));
    out.push_str(&format!("PRIORITY: {}\n", label(c.map(|c| c.priority.label()))));
    out.push_str(&format!("SENTIMENT: {}\n", label(c.map(|c| c.sentiment.label()))));
    out.push_str(&format!("NEEDS REPLY: {}\n", label(needs_reply)));
    if entry.needs_review {
        out.push_str("NEEDS REVIEW: yes\n");
    }
    out.push_str(&format!("STATUS: {}\n", entry.status));
    out.push('\n');
    out.push_str(entry.current_draft().unwrap_or_default());
    out.push('\n');
    out
}

/// Write the CSV table to `path`, creating parent directories.
pub async fn write_csv(path: &Path, entries: &[ReviewEntry]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, to_csv(entries)).await?;
    info!(path = %path.display(), rows = entries.len(), "Wrote CSV export");
    Ok(())
}

/// Write one `<timestamp>_<n>.txt` record per entry that has a draft.
/// Returns the written paths.
pub async fn write_records(dir: &Path, entries: &[ReviewEntry]) -> Result<Vec<PathBuf>, ExportError> {
    tokio::fs::create_dir_all(dir).await?;
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");

    let mut written = Vec::new();
    for (n, entry) in entries.iter().filter(|e| e.has_draft()).enumerate() {
        let path = dir.join(format!("{stamp}_{}.txt", n + 1));
        tokio::fs::write(&path, entry_record(entry)).await?;
        written.push(path);
    }

    info!(dir = %dir.display(), count = written.len(), "Wrote draft records");
    Ok(written)
}
