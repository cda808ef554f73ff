use jarvis_telemetry::{Action, InteractionEvent};
use std::collections::HashSet;

#[derive(Default)]
struct HistoryFilter {
    category: Option<String>,
    hours: Option<u64>,
    limit: Option<usize>,
}

fn filter_events<'a>(
    events: &'a [InteractionEvent],
    filter: &HistoryFilter,
) -> Vec<&'a InteractionEvent> {
    // A window longer than representable time covers the whole log
    let cutoff = filter.hours.and_then(|h| {
        let window = chrono::Duration::try_hours(i64::try_from(h).ok()?)?;
        chrono::Utc::now().checked_sub_signed(window)
    });

    events
        .iter()
        .filter(|e| {
            if let Some(ref cutoff) = cutoff {
                if e.timestamp < *cutoff {
                    return false;
                }
            }
            if let Some(ref category) = filter.category {
                if !e.category.eq_ignore_ascii_case(category) {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn compute_stats(events: &[InteractionEvent]) -> String {
    if events.is_empty() {
        return "No interactions to analyze.".to_string();
    }
    let total = events.len();
    let count = |action: Action| events.iter().filter(|e| e.action == action).count();
    let categories: HashSet<&str> = events.iter().map(|e| e.category.as_str()).collect();
    let positive = count(Action::Like) + count(Action::Complete);

    format!(
        "Total interactions: {}\n\
         Categories: {}\n\
         Views: {}  Likes: {}  Completions: {}  Skips: {}\n\
         Positive rate: {:.1}%",
        total,
        categories.len(),
        count(Action::View),
        count(Action::Like),
        count(Action::Complete),
        count(Action::Skip),
        positive as f64 / total as f64 * 100.0
    )
}

pub fn run(stats: bool, limit: usize, category: Option<String>, hours: Option<u64>) -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let events = engine.events()?;

    if events.is_empty() {
        println!("No interaction history");
        return Ok(());
    }

    let filter = HistoryFilter {
        category,
        hours,
        limit: Some(limit),
    };
    let filtered = filter_events(&events, &filter);

    if stats {
        let owned: Vec<InteractionEvent> = filtered.into_iter().cloned().collect();
        println!("{}", compute_stats(&owned));
        return Ok(());
    }

    let display: Vec<_> = filtered
        .into_iter()
        .rev()
        .take(filter.limit.unwrap_or(20))
        .collect();

    println!("Recent Interactions (last {})", display.len());
    println!("============================");
    for event in &display {
        println!(
            "  {} | {:<8} {} [{}]",
            event.timestamp.format("%Y-%m-%d %H:%M"),
            event.action,
            event.item_id,
            event.category,
        );
    }
    Ok(())
}
