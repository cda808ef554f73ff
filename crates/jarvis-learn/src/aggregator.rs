//! Decayed-sum preference aggregation over the interaction log

use chrono::{DateTime, Duration, Utc};
use jarvis_telemetry::{Action, InteractionEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category preference weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceScore {
    pub category: String,
    /// Always >= 0
    pub weight: f64,
    /// Newest event seen for this category
    pub last_updated: DateTime<Utc>,
}

/// Scores keyed by category, in stable order
pub type PreferenceScores = BTreeMap<String, PreferenceScore>;

/// Persisted result of a recompute (compatible with preferences.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    pub computed_at: DateTime<Utc>,
    pub half_life_secs: i64,
    #[serde(default)]
    pub scores: PreferenceScores,
}

impl PreferenceSnapshot {
    pub fn new(scores: PreferenceScores, computed_at: DateTime<Utc>, half_life: Duration) -> Self {
        Self {
            computed_at,
            half_life_secs: half_life.num_seconds(),
            scores,
        }
    }

    pub fn weight(&self, category: &str) -> f64 {
        self.scores.get(category).map_or(0.0, |s| s.weight)
    }
}

/// Fixed contribution of one action before decay
pub fn action_weight(action: Action) -> f64 {
    match action {
        Action::Complete => 3.0,
        Action::Like => 2.0,
        Action::View => 1.0,
        Action::Skip => -1.0,
    }
}

/// `exp(-ln2 * age / half_life)`; future timestamps count as age 0 and a
/// non-positive half-life disables decay
pub fn decay_factor(age: Duration, half_life: Duration) -> f64 {
    let half_life_ms = half_life.num_milliseconds();
    if half_life_ms <= 0 {
        return 1.0;
    }
    let age_ms = age.num_milliseconds().max(0) as f64;
    (-std::f64::consts::LN_2 * age_ms / half_life_ms as f64).exp()
}

/// Fold the full event history into per-category scores.
///
/// Pure and order-independent: events are sorted before summing so the same
/// set of events always produces bit-identical weights.
pub fn recompute(events: &[InteractionEvent], now: DateTime<Utc>, half_life: Duration) -> PreferenceScores {
    let mut ordered: Vec<&InteractionEvent> = events.iter().collect();
    ordered.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.item_id.cmp(&b.item_id))
            .then_with(|| a.action.as_str().cmp(b.action.as_str()))
    });

    let mut sums: BTreeMap<String, (f64, DateTime<Utc>)> = BTreeMap::new();
    for event in ordered {
        let contribution =
            action_weight(event.action) * decay_factor(now - event.timestamp, half_life);
        let entry = sums
            .entry(event.category.clone())
            .or_insert((0.0, event.timestamp));
        entry.0 += contribution;
        entry.1 = entry.1.max(event.timestamp);
    }

    sums.into_iter()
        .map(|(category, (sum, last_updated))| {
            // Skip-heavy categories clamp at zero
            let weight = if sum > 0.0 { sum } else { 0.0 };
            let score = PreferenceScore {
                category: category.clone(),
                weight,
                last_updated,
            };
            (category, score)
        })
        .collect()
}

/// Keep every previously known category present at weight 0 when the fresh
/// recompute no longer sees it (e.g. after retention pruning).
pub fn carry_forward<'a, I>(scores: &mut PreferenceScores, known: I, now: DateTime<Utc>)
where
    I: IntoIterator<Item = &'a str>,
{
    for category in known {
        if category.trim().is_empty() {
            continue;
        }
        scores
            .entry(category.to_string())
            .or_insert_with(|| PreferenceScore {
                category: category.to_string(),
                weight: 0.0,
                last_updated: now,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(now: DateTime<Utc>, days_ago: i64) -> DateTime<Utc> {
        now - Duration::days(days_ago)
    }

    #[test]
    fn test_action_weights() {
        assert_eq!(action_weight(Action::Complete), 3.0);
        assert_eq!(action_weight(Action::Like), 2.0);
        assert_eq!(action_weight(Action::View), 1.0);
        assert_eq!(action_weight(Action::Skip), -1.0);
    }

    #[test]
    fn test_decay_halves_each_half_life() {
        let half_life = Duration::days(7);
        assert_eq!(decay_factor(Duration::zero(), half_life), 1.0);
        assert!((decay_factor(Duration::days(7), half_life) - 0.5).abs() < 1e-12);
        assert!((decay_factor(Duration::days(14), half_life) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_decay_future_and_degenerate_half_life() {
        assert_eq!(decay_factor(Duration::minutes(-3), Duration::days(7)), 1.0);
        assert_eq!(decay_factor(Duration::days(30), Duration::zero()), 1.0);
    }

    #[test]
    fn test_complete_then_skip_scenario() {
        let now = Utc::now();
        let events = vec![
            InteractionEvent::new("a", "rust", Action::Complete, at(now, 1)),
            InteractionEvent::new("b", "rust", Action::Skip, now),
        ];

        let scores = recompute(&events, now, Duration::days(7));
        let weight = scores["rust"].weight;
        let expected = 3.0 * 2f64.powf(-1.0 / 7.0) - 1.0;
        assert!((weight - expected).abs() < 1e-9, "weight {}", weight);
        assert!((weight - 1.72).abs() < 0.01);
        assert_eq!(scores["rust"].last_updated, now);
    }

    #[test]
    fn test_skip_only_clamps_to_zero() {
        let now = Utc::now();
        let events = vec![
            InteractionEvent::new("a", "fitness", Action::Skip, at(now, 2)),
            InteractionEvent::new("b", "fitness", Action::Skip, now),
        ];
        let scores = recompute(&events, now, Duration::days(7));
        assert_eq!(scores["fitness"].weight, 0.0);
        assert!(scores["fitness"].weight.is_sign_positive());
    }

    #[test]
    fn test_every_category_gets_an_entry() {
        let now = Utc::now();
        let events = vec![
            InteractionEvent::new("a", "rust", Action::View, now),
            InteractionEvent::new("b", "news", Action::Skip, now),
        ];
        let scores = recompute(&events, now, Duration::days(7));
        assert_eq!(scores.len(), 2);
        assert!(scores.contains_key("news"));
    }

    #[test]
    fn test_empty_history() {
        let scores = recompute(&[], Utc::now(), Duration::days(7));
        assert!(scores.is_empty());
    }

    #[test]
    fn test_recompute_is_deterministic_and_order_independent() {
        let now = Utc::now();
        let mut events: Vec<InteractionEvent> = (0..40)
            .map(|i| {
                let action = Action::ALL[i % 4];
                let category = if i % 3 == 0 { "ml" } else { "rust" };
                InteractionEvent::new(format!("item{i}"), category, action, at(now, i as i64))
            })
            .collect();

        let first = recompute(&events, now, Duration::days(7));
        let second = recompute(&events, now, Duration::days(7));
        assert_eq!(first, second);

        events.reverse();
        let reversed = recompute(&events, now, Duration::days(7));
        assert_eq!(first, reversed);
    }

    #[test]
    fn test_weights_decay_as_now_advances() {
        let start = Utc::now();
        let events = vec![InteractionEvent::new("a", "rust", Action::Like, start)];
        let early = recompute(&events, start, Duration::days(7))["rust"].weight;
        let later = recompute(&events, start + Duration::days(3), Duration::days(7))["rust"].weight;
        assert!(later < early);
        assert!(later > 0.0);
    }

    #[test]
    fn test_carry_forward_keeps_known_categories() {
        let now = Utc::now();
        let mut scores = recompute(
            &[InteractionEvent::new("a", "rust", Action::Like, now)],
            now,
            Duration::days(7),
        );
        carry_forward(&mut scores, ["rust", "productivity", " "], now);

        assert_eq!(scores.len(), 2);
        assert_eq!(scores["productivity"].weight, 0.0);
        assert_eq!(scores["rust"].weight, 2.0);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let now = Utc::now();
        let scores = recompute(
            &[InteractionEvent::new("a", "rust", Action::Complete, now)],
            now,
            Duration::days(7),
        );
        let snapshot = PreferenceSnapshot::new(scores, now, Duration::days(7));
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: PreferenceSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.weight("rust"), 3.0);
        assert_eq!(parsed.weight("unknown"), 0.0);
        assert_eq!(parsed.half_life_secs, 7 * 86_400);
    }
}
