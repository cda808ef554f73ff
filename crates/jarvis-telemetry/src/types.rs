//! Interaction and content record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user did with a recommended item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Like,
    Skip,
    Complete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Like, Action::Skip, Action::Complete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Like => "like",
            Action::Skip => "skip",
            Action::Complete => "complete",
        }
    }
}

/// Content provider an item was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Youtube,
    Books,
    News,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Youtube, Source::Books, Source::News];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Youtube => "youtube",
            Source::Books => "books",
            Source::News => "news",
        }
    }
}

/// Unknown action or source name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Action {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "view" | "viewed" => Ok(Action::View),
            "like" | "liked" => Ok(Action::Like),
            "skip" | "skipped" => Ok(Action::Skip),
            "complete" | "completed" => Ok(Action::Complete),
            _ => Err(ParseKindError {
                kind: "action",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Source {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" => Ok(Source::Youtube),
            "books" => Ok(Source::Books),
            "news" => Ok(Source::News),
            _ => Err(ParseKindError {
                kind: "source",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user interaction, one line of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub item_id: String,
    pub category: String,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(
        item_id: impl Into<String>,
        category: impl Into<String>,
        action: Action,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            category: category.into(),
            action,
            timestamp,
        }
    }
}

/// A fetched candidate for recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub item_id: String,
    pub category: String,
    pub source: Source,
    pub fetched_at: DateTime<Utc>,
    /// Provider payload (title, url, authors...), never interpreted by the engine
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ContentItem {
    pub fn new(
        item_id: impl Into<String>,
        category: impl Into<String>,
        source: Source,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            category: category.into(),
            source,
            fetched_at,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        let event = InteractionEvent::new("vid1", "rust", Action::Complete, Utc::now());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"action\":\"complete\""));
    }

    #[test]
    fn test_action_parse_accepts_past_tense() {
        assert_eq!("liked".parse::<Action>(), Ok(Action::Like));
        assert_eq!("Complete".parse::<Action>(), Ok(Action::Complete));
        let err = "rate".parse::<Action>().unwrap_err();
        assert_eq!(err.kind, "action");
    }

    #[test]
    fn test_source_parse() {
        assert_eq!("news".parse::<Source>(), Ok(Source::News));
        assert!("github".parse::<Source>().is_err());
    }

    #[test]
    fn test_content_item_metadata_optional() {
        let json = r#"{"item_id":"b1","category":"programming","source":"books","fetched_at":"2025-01-01T00:00:00Z"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.source, Source::Books);
        assert!(item.metadata.is_null());
    }

    #[test]
    fn test_content_item_keeps_metadata() {
        let item = ContentItem::new("v1", "ml", Source::Youtube, Utc::now())
            .with_metadata(serde_json::json!({"title": "Intro to ML", "channel": "3b1b"}));
        let json = serde_json::to_string(&item).unwrap();
        let parsed: ContentItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.metadata["title"], "Intro to ML");
    }
}
