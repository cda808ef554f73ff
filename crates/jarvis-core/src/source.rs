//! Boundary for fetch adapters feeding the content pool

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jarvis_telemetry::{ContentItem, Source};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

/// A fetch adapter (YouTube, Books, News...).
///
/// Adapters own their auth, pagination and backoff, and hand back normalized
/// items or a [`EngineError::TransientFetch`].
#[async_trait]
pub trait ContentSource: Send + Sync {
    fn source(&self) -> Source;

    async fn fetch(&self) -> EngineResult<Vec<ContentItem>>;

    /// Called once the fetched items are published, so the next fetch does
    /// not deliver them again
    async fn acknowledge(&self) -> EngineResult<()> {
        Ok(())
    }
}

/// Line format accepted by [`JsonlSource`]
#[derive(Debug, Deserialize)]
struct DropRecord {
    item_id: String,
    category: String,
    #[serde(default)]
    fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// Reads candidate items for one source from a JSONL drop file.
///
/// Lines without `fetched_at` are stamped with the fetch time. A missing file
/// means nothing new was dropped. Acknowledging renames the file to
/// `<source>.jsonl.done`, so each drop is ingested once.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    source: Source,
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(source: Source, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }

    /// One drop file per source: `<dir>/<source>.jsonl`
    pub fn in_dir(source: Source, dir: impl Into<PathBuf>) -> Self {
        let path = dir.into().join(format!("{}.jsonl", source));
        Self::new(source, path)
    }

    /// Where a consumed drop file is moved
    pub fn done_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".done");
        PathBuf::from(name)
    }

    fn parse(&self, content: &str, now: DateTime<Utc>) -> Vec<ContentItem> {
        let mut items = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DropRecord>(line) {
                Ok(record) => items.push(ContentItem {
                    item_id: record.item_id,
                    category: record.category,
                    source: self.source,
                    fetched_at: record.fetched_at.unwrap_or(now),
                    metadata: record.metadata,
                }),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    "skipping malformed item: {e}"
                ),
            }
        }
        items
    }
}

#[async_trait]
impl ContentSource for JsonlSource {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch(&self) -> EngineResult<Vec<ContentItem>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(EngineError::TransientFetch {
                    provider: self.source,
                    reason: e.to_string(),
                })
            }
        };
        Ok(self.parse(&content, Utc::now()))
    }

    async fn acknowledge(&self) -> EngineResult<()> {
        match tokio::fs::rename(&self.path, self.done_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
