#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use jarvis_core::{Config, Engine};
use jarvis_telemetry::{Action, ContentItem, InteractionEvent, Paths, Source};
use std::path::Path;

/// Defaults without seed categories, so score maps only hold what a test records
pub fn sample_config() -> Config {
    let mut config = Config::new();
    config.seed_categories.clear();
    config
}

pub fn open_engine(dir: &Path) -> Engine {
    Engine::with_config(Paths::at(dir), sample_config()).unwrap()
}

pub fn event(item: &str, category: &str, action: Action, at: DateTime<Utc>) -> InteractionEvent {
    InteractionEvent::new(item, category, action, at)
}

pub fn item(id: &str, category: &str, source: Source, age: Duration, now: DateTime<Utc>) -> ContentItem {
    ContentItem::new(id, category, source, now - age)
        .with_metadata(serde_json::json!({ "title": format!("title of {id}") }))
}
