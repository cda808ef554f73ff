//! Recommendation ranking

use chrono::{DateTime, Utc};
use jarvis_learn::PreferenceScores;
use jarvis_telemetry::{ContentItem, Source};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

const MS_PER_DAY: f64 = 86_400_000.0;

/// A ranked candidate with its score
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub item: ContentItem,
    pub score: f64,
}

/// `1 / (1 + age_in_days)`; items stamped in the future count as fresh
pub fn recency_bonus(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_days = (now - fetched_at).num_milliseconds().max(0) as f64 / MS_PER_DAY;
    1.0 / (1.0 + age_days)
}

/// Rank candidates by category preference plus a recency bonus.
///
/// Excluded ids never appear. Duplicate (source, id) pairs collapse to the
/// most recently fetched copy. Ordering is total: score desc, `fetched_at`
/// desc, `item_id` asc, then source.
pub fn rank_scored<'a, I>(
    pool: I,
    scores: &PreferenceScores,
    exclude: &HashSet<String>,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<Ranked>
where
    I: IntoIterator<Item = &'a ContentItem>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut unique: HashMap<(Source, &str), &ContentItem> = HashMap::new();
    for item in pool {
        if exclude.contains(&item.item_id) {
            continue;
        }
        unique
            .entry((item.source, item.item_id.as_str()))
            .and_modify(|kept| {
                if item.fetched_at > kept.fetched_at {
                    *kept = item;
                }
            })
            .or_insert(item);
    }

    let mut ranked: Vec<Ranked> = unique
        .into_values()
        .map(|item| {
            let weight = scores.get(&item.category).map_or(0.0, |s| s.weight);
            Ranked {
                score: weight + recency_bonus(item.fetched_at, now),
                item: item.clone(),
            }
        })
        .collect();

    ranked.sort_by(compare);
    ranked.truncate(limit);
    ranked
}

/// [`rank_scored`] without the scores
pub fn rank<'a, I>(
    pool: I,
    scores: &PreferenceScores,
    exclude: &HashSet<String>,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<ContentItem>
where
    I: IntoIterator<Item = &'a ContentItem>,
{
    rank_scored(pool, scores, exclude, limit, now)
        .into_iter()
        .map(|r| r.item)
        .collect()
}

fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.item.fetched_at.cmp(&a.item.fetched_at))
        .then_with(|| a.item.item_id.cmp(&b.item.item_id))
        .then_with(|| a.item.source.cmp(&b.item.source))
}
