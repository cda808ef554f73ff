use chrono::Utc;
use jarvis_learn::PreferenceScores;

pub fn run() -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let scores = engine.recompute(Utc::now())?;
    println!("{}", render_scores(scores));
    Ok(())
}

/// Scores as JSON, heaviest category first
fn render_scores(scores: &PreferenceScores) -> serde_json::Value {
    let mut ordered: Vec<_> = scores.values().collect();
    ordered.sort_by(|a, b| b.weight.total_cmp(&a.weight).then(a.category.cmp(&b.category)));

    serde_json::Value::Array(
        ordered
            .into_iter()
            .map(|s| {
                serde_json::json!({
                    "category": s.category,
                    "weight": (s.weight * 1000.0).round() / 1000.0,
                    "last_updated": s.last_updated.to_rfc3339(),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jarvis_learn::recompute;
    use jarvis_telemetry::{Action, InteractionEvent};

    #[test]
    fn test_render_scores_orders_by_weight() {
        let now = Utc::now();
        let events = vec![
            InteractionEvent::new("a", "rust", Action::View, now),
            InteractionEvent::new("b", "ml", Action::Complete, now),
        ];
        let scores = recompute(&events, now, Duration::days(7));

        let rendered = render_scores(&scores);
        assert_eq!(rendered[0]["category"], "ml");
        assert_eq!(rendered[0]["weight"], 3.0);
        assert_eq!(rendered[1]["category"], "rust");
    }
}
