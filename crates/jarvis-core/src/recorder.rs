//! Interaction recorder over the append-only event log

use crate::error::{EngineError, EngineResult, Store};
use chrono::{DateTime, Duration, Utc};
use jarvis_telemetry::{append_jsonl, read_jsonl, write_jsonl, InteractionEvent};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Append-only JSONL log of interaction events
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    // Serializes appends and rewrites within the process
    write_lock: Mutex<()>,
}

impl EventLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &InteractionEvent) -> EngineResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        append_jsonl(&self.path, event)?;
        Ok(())
    }

    /// Read the whole log as it stands right now
    pub fn snapshot(&self) -> EngineResult<Vec<InteractionEvent>> {
        read_jsonl(&self.path).map_err(|e| EngineError::corrupt(Store::Events, e))
    }

    /// Move the log aside as `<stem>.<timestamp>.jsonl` so recording starts
    /// afresh; `None` when there was nothing to archive
    pub fn archive(&self, now: DateTime<Utc>) -> EngineResult<Option<PathBuf>> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let aside = self
            .path
            .with_extension(format!("{}.jsonl", now.format("%Y%m%dT%H%M%SZ")));
        match std::fs::rename(&self.path, &aside) {
            Ok(()) => Ok(Some(aside)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop events older than `now - retention` and all but the newest
    /// `max_events`; returns how many were removed
    pub fn prune(
        &self,
        now: DateTime<Utc>,
        retention: Option<Duration>,
        max_events: Option<usize>,
    ) -> EngineResult<usize> {
        if retention.is_none() && max_events.is_none() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let events: Vec<InteractionEvent> =
            read_jsonl(&self.path).map_err(|e| EngineError::corrupt(Store::Events, e))?;
        let before = events.len();

        // A window reaching past the earliest representable time keeps everything
        let cutoff = retention.and_then(|window| now.checked_sub_signed(window));
        let mut kept: Vec<InteractionEvent> = match cutoff {
            Some(cutoff) => events.into_iter().filter(|e| e.timestamp >= cutoff).collect(),
            None => events,
        };

        if let Some(max) = max_events {
            if kept.len() > max {
                let excess = kept.len() - max;
                kept.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
                kept.drain(..excess);
            }
        }

        let pruned = before - kept.len();
        if pruned > 0 {
            write_jsonl(&self.path, &kept)?;
        }
        Ok(pruned)
    }
}

/// Validates and durably records interaction events.
///
/// Cheap to clone; clones share the same log and may be used from any thread.
#[derive(Debug, Clone)]
pub struct Recorder {
    log: Arc<EventLog>,
    clock_skew: Duration,
}

impl Recorder {
    pub fn new(log: Arc<EventLog>, clock_skew: Duration) -> Self {
        Self { log, clock_skew }
    }

    pub fn record(&self, event: InteractionEvent) -> EngineResult<()> {
        self.record_at(event, Utc::now())
    }

    pub fn record_at(&self, event: InteractionEvent, now: DateTime<Utc>) -> EngineResult<()> {
        validate(&event, now, self.clock_skew)?;
        self.log.append(&event)?;
        debug!(
            item_id = %event.item_id,
            category = %event.category,
            action = %event.action,
            "recorded interaction"
        );
        Ok(())
    }
}

/// Reject events with blank identifiers or timestamps too far in the future
pub fn validate(event: &InteractionEvent, now: DateTime<Utc>, clock_skew: Duration) -> EngineResult<()> {
    if event.category.trim().is_empty() {
        return Err(EngineError::validation("category must not be empty"));
    }
    if event.item_id.trim().is_empty() {
        return Err(EngineError::validation("item_id must not be empty"));
    }
    let latest = now.checked_add_signed(clock_skew);
    if latest.is_some_and(|latest| event.timestamp > latest) {
        return Err(EngineError::validation(format!(
            "timestamp {} is in the future",
            event.timestamp.to_rfc3339()
        )));
    }
    Ok(())
}
