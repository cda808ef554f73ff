//! Fixed-cadence jobs driving recompute, fetch and housekeeping

use crate::config::Config;
use crate::engine::Engine;
use crate::error::EngineResult;
use crate::source::ContentSource;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use jarvis_telemetry::Source;
use std::fmt;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Work the scheduler can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Recompute,
    Fetch(Source),
    /// Log retention plus stale pool eviction
    Housekeeping,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Recompute => f.write_str("recompute"),
            Job::Fetch(source) => write!(f, "fetch:{source}"),
            Job::Housekeeping => f.write_str("housekeeping"),
        }
    }
}

/// When a job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Every(Duration),
    /// Once a day at a UTC wall-clock time
    DailyAt(NaiveTime),
}

impl Cadence {
    /// First firing strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Cadence::Every(interval) => now
                .checked_add_signed(interval.max(Duration::seconds(1)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Cadence::DailyAt(time) => {
                let today = now.date_naive().and_time(time).and_utc();
                if today > now {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub job: Job,
    pub cadence: Cadence,
    pub next_due: DateTime<Utc>,
}

impl ScheduledJob {
    pub fn new(job: Job, cadence: Cadence, now: DateTime<Utc>) -> Self {
        Self {
            job,
            cadence,
            next_due: cadence.next_after(now),
        }
    }

    /// Fire on the first tick instead of waiting a full period
    pub fn immediately(mut self, now: DateTime<Utc>) -> Self {
        self.next_due = now;
        self
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Single-loop scheduler; jobs run one at a time against `&mut Engine`
#[derive(Debug, Clone)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    pub fn new(jobs: Vec<ScheduledJob>) -> Self {
        Self { jobs }
    }

    /// Recompute on an interval (and once at startup), fetch each source
    /// daily at its configured time, housekeeping at midnight
    pub fn from_config(config: &Config, now: DateTime<Utc>) -> Self {
        let interval = Duration::from_std(config.recompute_interval()).unwrap_or(Duration::hours(1));
        let mut jobs = vec![ScheduledJob::new(Job::Recompute, Cadence::Every(interval), now).immediately(now)];
        for (source, time) in &config.fetch_times {
            jobs.push(ScheduledJob::new(Job::Fetch(*source), Cadence::DailyAt(*time), now));
        }
        jobs.push(ScheduledJob::new(
            Job::Housekeeping,
            Cadence::DailyAt(NaiveTime::MIN),
            now,
        ));
        Self::new(jobs)
    }

    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.jobs.iter().map(|j| j.next_due).min()
    }

    /// Jobs due at `now`, in registration order; each is rescheduled
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Job> {
        let mut due = Vec::new();
        for scheduled in &mut self.jobs {
            if scheduled.next_due <= now {
                due.push(scheduled.job);
                scheduled.next_due = scheduled.cadence.next_after(now);
            }
        }
        due
    }

    /// Run until `shutdown` flips to true (or its sender is dropped).
    ///
    /// Job failures are logged and retried at the job's next firing; they
    /// never stop the loop.
    pub async fn run(
        &mut self,
        engine: &mut Engine,
        sources: &[Box<dyn ContentSource>],
        mut shutdown: watch::Receiver<bool>,
    ) -> EngineResult<()> {
        info!(jobs = self.jobs.len(), "scheduler started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            let Some(next_due) = self.next_due() else {
                break;
            };

            let wait = (next_due - Utc::now()).to_std().unwrap_or_default();
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.changed() => break,
            }

            for job in self.take_due(Utc::now()) {
                let started = Instant::now();
                match run_job(engine, job, sources, &mut shutdown).await {
                    Ok(Flow::Continue) => info!(
                        job = %job,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "scheduled job finished"
                    ),
                    Ok(Flow::Stop) => {
                        info!(job = %job, "scheduled job cancelled by shutdown");
                        info!("scheduler stopped");
                        return Ok(());
                    }
                    Err(e) if e.is_transient() => {
                        warn!(job = %job, "scheduled job failed, retrying next run: {e}")
                    }
                    Err(e) => error!(job = %job, "scheduled job failed: {e}"),
                }
            }
        }
        info!("scheduler stopped");
        Ok(())
    }
}

async fn run_job(
    engine: &mut Engine,
    job: Job,
    sources: &[Box<dyn ContentSource>],
    shutdown: &mut watch::Receiver<bool>,
) -> EngineResult<Flow> {
    match job {
        Job::Recompute => {
            engine.recompute(Utc::now())?;
        }
        Job::Fetch(source) => {
            let Some(adapter) = sources.iter().find(|s| s.source() == source) else {
                debug!(%source, "no adapter registered");
                return Ok(Flow::Continue);
            };
            // Nothing is published until the fetch completes, so dropping it is safe
            let items = tokio::select! {
                fetched = adapter.fetch() => fetched?,
                _ = shutdown.changed() => return Ok(Flow::Stop),
            };
            engine
                .ingest_fetched(adapter.as_ref(), items, Utc::now())
                .await?;
        }
        Job::Housekeeping => {
            let now = Utc::now();
            let pruned = engine.prune(now);
            let evicted = engine.evict_stale(now);
            debug!(?pruned, ?evicted, "housekeeping");
            pruned?;
            evicted?;
        }
    }
    Ok(Flow::Continue)
}

/// Convenience for callers that only need a stop switch
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::JsonlSource;
    use chrono::TimeZone;
    use jarvis_telemetry::{ContentItem, Paths};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    fn seven() -> NaiveTime {
        NaiveTime::from_hms_opt(7, 0, 0).unwrap()
    }

    #[test]
    fn test_daily_cadence_same_day_and_rollover() {
        let cadence = Cadence::DailyAt(seven());
        assert_eq!(cadence.next_after(at(6, 30)), at(7, 0));
        assert_eq!(
            cadence.next_after(at(7, 0)),
            at(7, 0) + Duration::days(1)
        );
        assert_eq!(
            cadence.next_after(at(23, 59)),
            at(7, 0) + Duration::days(1)
        );
    }

    #[test]
    fn test_interval_cadence() {
        let cadence = Cadence::Every(Duration::minutes(30));
        assert_eq!(cadence.next_after(at(9, 0)), at(9, 30));
        // Zero intervals would spin
        assert_eq!(
            Cadence::Every(Duration::zero()).next_after(at(9, 0)),
            at(9, 0) + Duration::seconds(1)
        );
    }

    #[test]
    fn test_from_config_jobs() {
        let now = at(6, 30);
        let scheduler = Scheduler::from_config(&Config::new(), now);
        let jobs: Vec<Job> = scheduler.jobs().iter().map(|j| j.job).collect();

        assert_eq!(jobs[0], Job::Recompute);
        assert!(jobs.contains(&Job::Fetch(Source::Youtube)));
        assert!(jobs.contains(&Job::Fetch(Source::Books)));
        assert!(jobs.contains(&Job::Fetch(Source::News)));
        assert!(jobs.contains(&Job::Housekeeping));
        // Recompute runs at startup
        assert_eq!(scheduler.next_due(), Some(now));
    }

    #[test]
    fn test_take_due_reschedules() {
        let now = at(6, 59);
        let mut scheduler = Scheduler::new(vec![
            ScheduledJob::new(Job::Fetch(Source::Youtube), Cadence::DailyAt(seven()), now),
            ScheduledJob::new(Job::Recompute, Cadence::Every(Duration::hours(1)), now),
        ]);

        assert!(scheduler.take_due(now).is_empty());
        assert_eq!(scheduler.take_due(at(7, 0)), vec![Job::Fetch(Source::Youtube)]);
        assert_eq!(scheduler.jobs()[0].next_due, at(7, 0) + Duration::days(1));
        assert_eq!(scheduler.take_due(at(8, 0)), vec![Job::Recompute]);
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut engine = Engine::with_config(Paths::at(temp.path()), Config::new()).unwrap();
        let mut scheduler = Scheduler::from_config(engine.config(), Utc::now());
        let (tx, rx) = shutdown_channel();
        tx.send(true).unwrap();

        scheduler.run(&mut engine, &[], rx).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_fetches_due_source_then_stops() {
        let temp = tempfile::TempDir::new().unwrap();
        let drop_dir = temp.path().join("incoming");
        std::fs::create_dir_all(&drop_dir).unwrap();
        std::fs::write(
            drop_dir.join("news.jsonl"),
            "{\"item_id\":\"n1\",\"category\":\"technology\"}\n",
        )
        .unwrap();

        let mut engine = Engine::with_config(Paths::at(temp.path()), Config::new()).unwrap();
        let now = Utc::now();
        let mut scheduler = Scheduler::new(vec![ScheduledJob::new(
            Job::Fetch(Source::News),
            Cadence::Every(Duration::hours(1)),
            now,
        )
        .immediately(now)]);
        let sources: Vec<Box<dyn ContentSource>> =
            vec![Box::new(JsonlSource::in_dir(Source::News, &drop_dir))];
        let (tx, rx) = shutdown_channel();

        let stopper = async {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(scheduler.run(&mut engine, &sources, rx), stopper);

        result.unwrap();
        assert_eq!(engine.pool().len_for(Source::News), 1);
        // The drop is consumed so tomorrow's run does not ingest it again
        assert!(drop_dir.join("news.jsonl.done").exists());
        assert!(!drop_dir.join("news.jsonl").exists());
    }

    /// Never finishes within a test's lifetime
    struct StalledSource;

    #[async_trait::async_trait]
    impl ContentSource for StalledSource {
        fn source(&self) -> Source {
            Source::Youtube
        }

        async fn fetch(&self) -> EngineResult<Vec<ContentItem>> {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            Ok(vec![ContentItem::new("late", "rust", Source::Youtube, Utc::now())])
        }
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_fetch() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut engine = Engine::with_config(Paths::at(temp.path()), Config::new()).unwrap();
        let now = Utc::now();
        let mut scheduler = Scheduler::new(vec![ScheduledJob::new(
            Job::Fetch(Source::Youtube),
            Cadence::Every(Duration::hours(1)),
            now,
        )
        .immediately(now)]);
        let sources: Vec<Box<dyn ContentSource>> = vec![Box::new(StalledSource)];
        let (tx, rx) = shutdown_channel();

        let stopper = async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(scheduler.run(&mut engine, &sources, rx), stopper);

        result.unwrap();
        assert!(engine.pool().is_empty());
        assert!(!temp.path().join("pool.json").exists());
    }
}
