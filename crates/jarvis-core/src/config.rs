//! Engine configuration

use crate::error::{EngineError, EngineResult, Store};
use chrono::{Duration, NaiveTime};
use jarvis_telemetry::{read_json, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Pool admission and capacity rules
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// Re-fetches of the same id inside this window are rejected
    pub min_refresh_interval: Duration,
    /// Per-source cap; oldest `fetched_at` is evicted first
    pub max_items_per_source: usize,
    /// Items already older than this on arrival are rejected
    pub max_item_age: Duration,
}

/// Engine configuration (compatible with config.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preference half-life
    pub half_life_days: f64,

    /// How far in the future an event timestamp may be
    pub clock_skew_secs: i64,

    pub min_refresh_interval_secs: i64,

    pub max_items_per_source: usize,

    /// Pool items older than this are evicted by housekeeping
    pub max_item_age_days: i64,

    /// Events older than this are pruned from the log (None keeps everything)
    pub retention_days: Option<i64>,

    /// Keep at most this many of the newest events
    pub max_events: Option<usize>,

    /// Default number of recommendations
    pub recommend_limit: usize,

    pub recompute_interval_secs: u64,

    /// Daily fetch time per source (UTC)
    pub fetch_times: BTreeMap<Source, NaiveTime>,

    /// Categories that always exist in the score map
    pub seed_categories: Vec<String>,
}

impl Config {
    pub fn new() -> Self {
        let mut fetch_times = BTreeMap::new();
        fetch_times.insert(Source::News, daily(6));
        fetch_times.insert(Source::Youtube, daily(7));
        fetch_times.insert(Source::Books, daily(8));

        Self {
            half_life_days: 7.0,
            clock_skew_secs: 300,
            min_refresh_interval_secs: 3600,
            max_items_per_source: 200,
            max_item_age_days: 30,
            retention_days: None,
            max_events: None,
            recommend_limit: 5,
            recompute_interval_secs: 3600,
            fetch_times,
            seed_categories: vec![
                "python programming".to_string(),
                "productivity".to_string(),
                "machine learning".to_string(),
                "technology".to_string(),
            ],
        }
    }

    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> EngineResult<Self> {
        match read_json::<Config>(path) {
            Ok(Some(config)) => Ok(config),
            Ok(None) => Ok(Self::new()),
            Err(e) => Err(EngineError::corrupt(Store::Config, e)),
        }
    }

    /// Out-of-range values saturate; non-positive or NaN disables decay
    pub fn half_life(&self) -> Duration {
        let millis = self.half_life_days * 86_400_000.0;
        if millis.is_nan() || millis <= 0.0 {
            return Duration::zero();
        }
        Duration::try_milliseconds(millis as i64).unwrap_or(Duration::MAX)
    }

    pub fn clock_skew(&self) -> Duration {
        saturating(Duration::try_seconds, self.clock_skew_secs)
    }

    /// Saturates, so "effectively never" values are safe to configure
    pub fn max_item_age(&self) -> Duration {
        saturating(Duration::try_days, self.max_item_age_days)
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_days.map(|days| saturating(Duration::try_days, days))
    }

    pub fn recompute_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.recompute_interval_secs.max(1))
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            min_refresh_interval: saturating(Duration::try_seconds, self.min_refresh_interval_secs),
            max_items_per_source: self.max_items_per_source,
            max_item_age: self.max_item_age(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Negative counts clamp to zero, overflowing ones to [`Duration::MAX`]
fn saturating(build: fn(i64) -> Option<Duration>, n: i64) -> Duration {
    build(n.max(0)).unwrap_or(Duration::MAX)
}

fn daily(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new();
        assert_eq!(config.half_life(), Duration::days(7));
        assert_eq!(config.clock_skew(), Duration::minutes(5));
        assert_eq!(config.refresh_policy().max_items_per_source, 200);
        assert_eq!(config.fetch_times[&Source::Youtube], daily(7));
        assert!(config.retention().is_none());
    }

    #[test]
    fn test_partial_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"half_life_days": 14, "max_events": 1000}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.half_life(), Duration::days(14));
        assert_eq!(config.max_events, Some(1000));
        // Unspecified fields keep their defaults
        assert_eq!(config.recommend_limit, 5);
        assert_eq!(config.fetch_times.len(), 3);
    }

    #[test]
    fn test_extreme_values_saturate() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"max_item_age_days": 1000000000, "retention_days": 9223372036854775807,
                "clock_skew_secs": -5, "min_refresh_interval_secs": 9223372036854775807,
                "half_life_days": -1e308}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_item_age(), Duration::MAX);
        assert_eq!(config.retention(), Some(Duration::MAX));
        assert_eq!(config.clock_skew(), Duration::zero());
        assert_eq!(config.refresh_policy().min_refresh_interval, Duration::MAX);
        assert_eq!(config.half_life(), Duration::zero());

        let mut config = Config::new();
        config.half_life_days = f64::INFINITY;
        assert_eq!(config.half_life(), Duration::MAX);
    }

    #[test]
    fn test_missing_and_corrupt_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        assert_eq!(Config::load(&path).unwrap().max_item_age_days, 30);

        std::fs::write(&path, "half_life_days = 3").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(
            err,
            EngineError::CorruptState {
                store: Store::Config,
                ..
            }
        ));
    }
}
