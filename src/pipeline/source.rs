//! Message sources: where raw mail comes from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::triage::types::RawMessage;

/// Supplies unread raw messages. Pure I/O, no triage logic.
///
/// A failure here aborts the whole batch.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Source name (e.g. "directory").
    fn name(&self) -> &str;

    /// Fetch up to `max_count` unread messages, in a stable order.
    async fn fetch_unread_messages(&self, max_count: usize) -> Result<Vec<RawMessage>, SourceError>;

    /// Mark messages as handled so they are not fetched again.
    async fn acknowledge(&self, _ids: &[String]) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Reads `.eml` / `.txt` files from a directory. The file name is the id.
///
/// With an archive directory configured, acknowledged files are moved there.
pub struct DirectorySource {
    incoming: PathBuf,
    archive: Option<PathBuf>,
}

impl DirectorySource {
    pub fn new(incoming: impl Into<PathBuf>) -> Self {
        Self {
            incoming: incoming.into(),
            archive: None,
        }
    }

    /// Move acknowledged files into `archive`.
    pub fn with_archive(mut self, archive: impl Into<PathBuf>) -> Self {
        self.archive = Some(archive.into());
        self
    }
}

fn is_mail_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("eml") || ext.eq_ignore_ascii_case("txt"))
}

#[async_trait]
impl MessageSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn fetch_unread_messages(&self, max_count: usize) -> Result<Vec<RawMessage>, SourceError> {
        let mut dir = tokio::fs::read_dir(&self.incoming).await.map_err(|e| {
            SourceError::Unavailable {
                name: self.incoming.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut files = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if item.file_type().await?.is_file() && is_mail_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        files.truncate(max_count);

        let mut messages = Vec::with_capacity(files.len());
        for path in files {
            let Some(id) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                warn!(path = %path.display(), "Skipping file with non-UTF-8 name");
                continue;
            };
            let data = tokio::fs::read(&path).await?;
            debug!(id = %id, bytes = data.len(), "Read message file");
            messages.push(RawMessage::new(id, data));
        }

        info!(
            dir = %self.incoming.display(),
            count = messages.len(),
            "Fetched messages from directory"
        );
        Ok(messages)
    }

    async fn acknowledge(&self, ids: &[String]) -> Result<(), SourceError> {
        let Some(archive) = &self.archive else {
            return Ok(());
        };
        tokio::fs::create_dir_all(archive).await?;

        for id in ids {
            let from = self.incoming.join(id);
            let to = archive.join(id);
            match tokio::fs::rename(&from, &to).await {
                Ok(()) => debug!(id = %id, "Archived message file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(id = %id, "Message file vanished before archiving");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
