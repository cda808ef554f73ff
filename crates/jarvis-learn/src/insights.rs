//! Usage insights derived from the interaction log

use crate::aggregator::PreferenceScores;
use chrono::Datelike;
use jarvis_telemetry::{InteractionEvent, Source};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of how the user engages with recommendations
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub total_interactions: usize,
    pub by_action: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    /// Weekday name and interaction count, busiest first
    pub most_active_days: Vec<(String, usize)>,
    /// Highest-weighted categories
    pub top_categories: Vec<(String, f64)>,
    /// Interactions per content source, for items whose source is known
    pub by_source: BTreeMap<String, usize>,
}

impl Insights {
    pub fn from_events(events: &[InteractionEvent], scores: &PreferenceScores, top_n: usize) -> Self {
        let mut by_action = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut day_counts = [0usize; 7];

        for event in events {
            *by_action.entry(event.action.to_string()).or_insert(0) += 1;
            *by_category.entry(event.category.clone()).or_insert(0) += 1;
            day_counts[event.timestamp.weekday().num_days_from_monday() as usize] += 1;
        }

        let mut most_active_days: Vec<(usize, usize)> = day_counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(day, &count)| (day, count))
            .collect();
        // Busiest first, Monday-first among ties
        most_active_days.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut top_categories: Vec<(String, f64)> = scores
            .values()
            .filter(|s| s.weight > 0.0)
            .map(|s| (s.category.clone(), s.weight))
            .collect();
        top_categories.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        top_categories.truncate(top_n);

        Self {
            total_interactions: events.len(),
            by_action,
            by_category,
            most_active_days: most_active_days
                .into_iter()
                .map(|(day, count)| (weekday_name(day).to_string(), count))
                .collect(),
            top_categories,
            by_source: BTreeMap::new(),
        }
    }

    /// Fill `by_source` using `source_of` to resolve each event's item
    pub fn with_sources<F>(mut self, events: &[InteractionEvent], source_of: F) -> Self
    where
        F: Fn(&str) -> Option<Source>,
    {
        for event in events {
            if let Some(source) = source_of(&event.item_id) {
                *self.by_source.entry(source.to_string()).or_insert(0) += 1;
            }
        }
        self
    }
}

fn weekday_name(days_from_monday: usize) -> &'static str {
    const NAMES: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    NAMES[days_from_monday % 7]
}
