//! Preference & recommendation engine: recording, ranking, pool refresh and scheduling

mod config;
mod engine;
mod error;
mod pool;
mod ranker;
mod recorder;
mod scheduler;
mod source;

pub use config::{Config, RefreshPolicy};
pub use engine::{Engine, EngineStatus, StoreHealth, StoreState};
pub use error::{EngineError, EngineResult, Store};
pub use pool::{ContentPool, IngestCounts, PoolSnapshot};
pub use ranker::{rank, rank_scored, recency_bonus, Ranked};
pub use recorder::{validate, EventLog, Recorder};
pub use scheduler::{shutdown_channel, Cadence, Job, ScheduledJob, Scheduler};
pub use source::{ContentSource, JsonlSource};
