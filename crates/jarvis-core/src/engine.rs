//! The engine: stores, health tracking and the operations that tie them together

use crate::config::Config;
use crate::error::{EngineError, EngineResult, Store};
use crate::pool::{ContentPool, IngestCounts, PoolSnapshot};
use crate::ranker::{rank_scored, Ranked};
use crate::recorder::{EventLog, Recorder};
use crate::source::ContentSource;
use chrono::{DateTime, Utc};
use jarvis_learn::{carry_forward, recompute, Insights, PreferenceScores, PreferenceSnapshot};
use jarvis_telemetry::{atomic_write, read_json, ContentItem, InteractionEvent, Paths, Source};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Health of one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum StoreState {
    Ok,
    Degraded(String),
}

impl StoreState {
    pub fn is_ok(&self) -> bool {
        matches!(self, StoreState::Ok)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    pub events: StoreState,
    pub preferences: StoreState,
    pub pool: StoreState,
    /// Degraded when `config.json` is unreadable and defaults are in effect
    pub config: StoreState,
}

impl StoreHealth {
    fn healthy() -> Self {
        Self {
            events: StoreState::Ok,
            preferences: StoreState::Ok,
            pool: StoreState::Ok,
            config: StoreState::Ok,
        }
    }

    fn set(&mut self, store: Store, state: StoreState) {
        match store {
            Store::Events => self.events = state,
            Store::Preferences => self.preferences = state,
            Store::Pool => self.pool = state,
            Store::Config => self.config = state,
        }
    }
}

/// Point-in-time summary for operators
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub data_dir: String,
    pub events: Option<usize>,
    pub categories: usize,
    pub scores_computed_at: DateTime<Utc>,
    pub pool: BTreeMap<String, usize>,
    pub health: StoreHealth,
}

/// Preference & recommendation engine over the on-disk stores.
///
/// Single writer: mutating operations take `&mut self` and are driven from
/// one loop. Only recording is shared, through [`Engine::recorder`].
pub struct Engine {
    paths: Paths,
    config: Config,
    log: Arc<EventLog>,
    recorder: Recorder,
    pool: ContentPool,
    preferences: PreferenceSnapshot,
    health: StoreHealth,
}

impl Engine {
    /// Open the stores under `paths`, loading `config.json` if present
    ///
    /// An unreadable config file leaves the engine on defaults with the config
    /// store reported as degraded.
    pub fn open(paths: Paths) -> EngineResult<Self> {
        match Config::load(&paths.config_file()) {
            Ok(config) => Self::with_config(paths, config),
            Err(e) => {
                warn!("{e}; using default configuration");
                let mut engine = Self::with_config(paths, Config::new())?;
                engine.health.config = StoreState::Degraded(e.to_string());
                Ok(engine)
            }
        }
    }

    /// Open the stores with an explicit configuration.
    ///
    /// A corrupt pool or score snapshot is moved aside and the engine starts
    /// with that store degraded; only a failure to create the data directory
    /// is fatal.
    pub fn with_config(paths: Paths, config: Config) -> EngineResult<Self> {
        std::fs::create_dir_all(paths.data_dir())?;
        let now = Utc::now();
        let mut health = StoreHealth::healthy();

        let pool = match read_json::<PoolSnapshot>(&paths.pool_file()) {
            Ok(Some(snapshot)) => ContentPool::from_items(snapshot.items),
            Ok(None) => ContentPool::new(),
            Err(e) => {
                error!("{e}; starting with an empty pool");
                quarantine(&paths.pool_file());
                health.pool = StoreState::Degraded(e.to_string());
                ContentPool::new()
            }
        };

        let stored = match read_json::<PreferenceSnapshot>(&paths.preferences_file()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("{e}; rebuilding preferences from the event log");
                quarantine(&paths.preferences_file());
                health.preferences = StoreState::Degraded(e.to_string());
                None
            }
        };
        let needs_rebuild = stored.is_none();

        let log = Arc::new(EventLog::open(paths.events_file()));
        let recorder = Recorder::new(log.clone(), config.clock_skew());
        let mut preferences = stored.unwrap_or_else(|| {
            PreferenceSnapshot::new(PreferenceScores::new(), now, config.half_life())
        });
        carry_forward(
            &mut preferences.scores,
            config.seed_categories.iter().map(String::as_str),
            now,
        );

        let mut engine = Self {
            paths,
            config,
            log,
            recorder,
            pool,
            preferences,
            health,
        };

        if needs_rebuild {
            if let Err(e) = engine.recompute(now) {
                error!("initial recompute failed: {e}");
            }
        }

        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn health(&self) -> &StoreHealth {
        &self.health
    }

    pub fn pool(&self) -> &ContentPool {
        &self.pool
    }

    pub fn scores(&self) -> &PreferenceScores {
        &self.preferences.scores
    }

    pub fn preferences(&self) -> &PreferenceSnapshot {
        &self.preferences
    }

    /// Shareable handle for command handlers
    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    pub fn record(&self, event: InteractionEvent) -> EngineResult<()> {
        self.recorder.record(event)
    }

    /// Current contents of the event log
    pub fn events(&mut self) -> EngineResult<Vec<InteractionEvent>> {
        let result = self.log.snapshot();
        self.track(Store::Events, &result);
        result
    }

    /// Rebuild preference scores from the full log and persist them.
    ///
    /// If the log is unreadable the previous scores stay in effect.
    pub fn recompute(&mut self, now: DateTime<Utc>) -> EngineResult<&PreferenceScores> {
        let events = self.events()?;
        let half_life = self.config.half_life();

        let mut scores = recompute(&events, now, half_life);
        carry_forward(
            &mut scores,
            self.preferences.scores.keys().map(String::as_str),
            now,
        );
        carry_forward(
            &mut scores,
            self.config.seed_categories.iter().map(String::as_str),
            now,
        );

        let snapshot = PreferenceSnapshot::new(scores, now, half_life);
        let json = serde_json::to_vec_pretty(&snapshot)?;
        atomic_write(&self.paths.preferences_file(), &json)?;

        info!(
            events = events.len(),
            categories = snapshot.scores.len(),
            "recomputed preferences"
        );
        self.preferences = snapshot;
        self.health.preferences = StoreState::Ok;
        Ok(&self.preferences.scores)
    }

    /// Rank the pool against current scores, leaving out anything already acted on
    pub fn recommend(&mut self, limit: usize, source: Option<Source>, now: DateTime<Utc>) -> Vec<Ranked> {
        let exclude: HashSet<String> = match self.events() {
            Ok(events) => events.into_iter().map(|e| e.item_id).collect(),
            Err(e) => {
                warn!("{e}; recommending without history");
                HashSet::new()
            }
        };

        let candidates = self
            .pool
            .items()
            .filter(|item| source.map_or(true, |s| item.source == s));
        rank_scored(candidates, &self.preferences.scores, &exclude, limit, now)
    }

    /// Merge fetched items into the pool, persisting before publishing
    pub fn ingest(&mut self, items: Vec<ContentItem>, now: DateTime<Utc>) -> EngineResult<IngestCounts> {
        let (next, counts) = self.pool.ingested(items, &self.config.refresh_policy(), now);
        self.publish_pool(next, now)?;
        info!(
            added = counts.added,
            updated = counts.updated,
            rejected = counts.rejected,
            evicted = counts.evicted,
            "ingested content"
        );
        Ok(counts)
    }

    /// Fetch from one adapter and ingest the result
    pub async fn refresh_source(
        &mut self,
        source: &dyn ContentSource,
        now: DateTime<Utc>,
    ) -> EngineResult<IngestCounts> {
        let items = source.fetch().await?;
        self.ingest_fetched(source, items, now).await
    }

    /// Ingest a completed fetch, then let the adapter mark it consumed.
    ///
    /// The pool is already published when acknowledging fails, so that is
    /// only logged; the refresh guard absorbs a repeated delivery.
    pub(crate) async fn ingest_fetched(
        &mut self,
        source: &dyn ContentSource,
        items: Vec<ContentItem>,
        now: DateTime<Utc>,
    ) -> EngineResult<IngestCounts> {
        let counts = self.ingest(items, now)?;
        if let Err(e) = source.acknowledge().await {
            warn!(source = %source.source(), "could not mark fetch as consumed: {e}");
        }
        Ok(counts)
    }

    /// Archive the interaction log and return preferences to the seed
    /// categories at weight 0; returns where the old log went
    pub fn reset(&mut self, now: DateTime<Utc>) -> EngineResult<Option<PathBuf>> {
        let archived = self.log.archive(now)?;
        self.preferences.scores.clear();
        self.recompute(now)?;
        info!(archived = ?archived, "preferences reset to defaults");
        Ok(archived)
    }

    /// Drop pool items past `max_item_age`
    pub fn evict_stale(&mut self, now: DateTime<Utc>) -> EngineResult<usize> {
        let mut next = self.pool.clone();
        let evicted = next.evict_stale(now, self.config.max_item_age());
        if evicted > 0 {
            self.publish_pool(next, now)?;
            info!(evicted, "evicted stale content");
        }
        Ok(evicted)
    }

    /// Apply the configured retention window and event cap to the log
    pub fn prune(&mut self, now: DateTime<Utc>) -> EngineResult<usize> {
        let result = self
            .log
            .prune(now, self.config.retention(), self.config.max_events);
        self.track(Store::Events, &result);
        let pruned = result?;
        if pruned > 0 {
            info!(pruned, "pruned interaction log");
        }
        Ok(pruned)
    }

    pub fn insights(&mut self, top_n: usize) -> EngineResult<Insights> {
        let events = self.events()?;
        let sources: HashMap<&str, Source> = self
            .pool
            .items()
            .map(|item| (item.item_id.as_str(), item.source))
            .collect();
        Ok(Insights::from_events(&events, &self.preferences.scores, top_n)
            .with_sources(&events, |id| sources.get(id).copied()))
    }

    pub fn status(&mut self) -> EngineStatus {
        let events = self.events().ok().map(|e| e.len());
        let pool = Source::ALL
            .iter()
            .map(|s| (s.to_string(), self.pool.len_for(*s)))
            .collect();

        EngineStatus {
            data_dir: self.paths.data_dir().display().to_string(),
            events,
            categories: self.preferences.scores.len(),
            scores_computed_at: self.preferences.computed_at,
            pool,
            health: self.health.clone(),
        }
    }

    fn publish_pool(&mut self, next: ContentPool, now: DateTime<Utc>) -> EngineResult<()> {
        let json = serde_json::to_vec_pretty(&next.snapshot(now))?;
        atomic_write(&self.paths.pool_file(), &json)?;
        self.pool = next;
        self.health.pool = StoreState::Ok;
        Ok(())
    }

    fn track<T>(&mut self, store: Store, result: &EngineResult<T>) {
        match result {
            Ok(_) => self.health.set(store, StoreState::Ok),
            Err(e @ EngineError::CorruptState { .. }) => {
                error!("{e}");
                self.health.set(store, StoreState::Degraded(e.to_string()));
            }
            Err(_) => {}
        }
    }
}

/// Move an unreadable store aside so the next write starts clean
fn quarantine(path: &Path) {
    let aside = path.with_extension("corrupt");
    if let Err(e) = std::fs::rename(path, &aside) {
        warn!(path = %path.display(), "could not move corrupt store aside: {e}");
    }
}
