//! Content pool and the refresher that feeds it

use crate::config::RefreshPolicy;
use chrono::{DateTime, Duration, Utc};
use jarvis_telemetry::{ContentItem, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type PoolKey = (Source, String);

/// Outcome of one ingest batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    pub added: usize,
    pub updated: usize,
    pub rejected: usize,
    pub evicted: usize,
}

/// On-disk form of the pool (compatible with pool.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

/// Working set of fetched, not yet recommended items, unique per (source, item_id)
#[derive(Debug, Clone, Default)]
pub struct ContentPool {
    items: BTreeMap<PoolKey, ContentItem>,
}

impl ContentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw items; duplicate ids keep the most recently fetched copy
    pub fn from_items(items: Vec<ContentItem>) -> Self {
        let mut pool = Self::new();
        for item in items {
            let key = (item.source, item.item_id.clone());
            let newer = pool
                .items
                .get(&key)
                .map_or(true, |existing| item.fetched_at > existing.fetched_at);
            if newer {
                pool.items.insert(key, item);
            }
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len_for(&self, source: Source) -> usize {
        self.items.keys().filter(|(s, _)| *s == source).count()
    }

    pub fn get(&self, source: Source, item_id: &str) -> Option<&ContentItem> {
        self.items.get(&(source, item_id.to_string()))
    }

    pub fn items(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.values()
    }

    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> PoolSnapshot {
        PoolSnapshot {
            saved_at,
            items: self.items.values().cloned().collect(),
        }
    }

    /// Merge a batch into a copy of the pool and return it with the counts.
    ///
    /// `self` is left untouched so callers can persist the new pool before
    /// publishing it. Items already past `max_item_age` at `now` are rejected.
    pub fn ingested(
        &self,
        batch: Vec<ContentItem>,
        policy: &RefreshPolicy,
        now: DateTime<Utc>,
    ) -> (ContentPool, IngestCounts) {
        let mut next = self.clone();
        let mut counts = IngestCounts::default();
        let cutoff = now.checked_sub_signed(policy.max_item_age);

        for item in batch {
            if item.item_id.trim().is_empty() || item.category.trim().is_empty() {
                counts.rejected += 1;
                continue;
            }
            if cutoff.is_some_and(|cutoff| item.fetched_at < cutoff) {
                counts.rejected += 1;
                continue;
            }

            let key = (item.source, item.item_id.clone());
            match next.items.get_mut(&key) {
                Some(existing) => {
                    if item.fetched_at - existing.fetched_at < policy.min_refresh_interval {
                        counts.rejected += 1;
                    } else {
                        existing.category = item.category;
                        existing.metadata = item.metadata;
                        existing.fetched_at = item.fetched_at;
                        counts.updated += 1;
                    }
                }
                None => {
                    next.items.insert(key, item);
                    counts.added += 1;
                }
            }
        }

        counts.evicted = next.enforce_capacity(policy.max_items_per_source);
        (next, counts)
    }

    /// In-place variant of [`ContentPool::ingested`]
    pub fn ingest(&mut self, batch: Vec<ContentItem>, policy: &RefreshPolicy, now: DateTime<Utc>) -> IngestCounts {
        let (next, counts) = self.ingested(batch, policy, now);
        *self = next;
        counts
    }

    /// Drop items fetched more than `max_age` before `now`
    pub fn evict_stale(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        // An age reaching past the earliest representable time keeps everything
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return 0;
        };
        let before = self.items.len();
        self.items.retain(|_, item| item.fetched_at >= cutoff);
        before - self.items.len()
    }

    fn enforce_capacity(&mut self, max_per_source: usize) -> usize {
        let mut evicted = 0;
        for source in Source::ALL {
            let mut keys: Vec<(DateTime<Utc>, PoolKey)> = self
                .items
                .iter()
                .filter(|((s, _), _)| *s == source)
                .map(|(key, item)| (item.fetched_at, key.clone()))
                .collect();
            if keys.len() <= max_per_source {
                continue;
            }
            // Oldest first; ties by id keep eviction deterministic
            keys.sort();
            let excess = keys.len() - max_per_source;
            for (_, key) in keys.into_iter().take(excess) {
                self.items.remove(&key);
                evicted += 1;
            }
        }
        evicted
    }
}
