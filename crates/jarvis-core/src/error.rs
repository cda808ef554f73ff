//! Engine error taxonomy

use jarvis_telemetry::Source;
use serde::Serialize;
use std::fmt;

/// Persistent stores the engine manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Events,
    Preferences,
    Pool,
    Config,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Store::Events => "events",
            Store::Preferences => "preferences",
            Store::Pool => "pool",
            Store::Config => "config",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed input, surfaced to the caller
    #[error("invalid input: {0}")]
    Validation(String),

    /// Adapter-side failure, retried on the next scheduled run
    #[error("fetch from {provider} failed: {reason}")]
    TransientFetch { provider: Source, reason: String },

    /// A store could not be read; only that store is affected
    #[error("{store} store is corrupt: {details}")]
    CorruptState { store: Store, details: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn corrupt(store: Store, details: impl fmt::Display) -> Self {
        EngineError::CorruptState {
            store,
            details: details.to_string(),
        }
    }

    /// Whether the failure should be retried on the next tick rather than surfaced
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::TransientFetch { .. } | EngineError::Io(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
