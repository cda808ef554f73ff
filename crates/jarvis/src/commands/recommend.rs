use chrono::Utc;
use jarvis_core::Ranked;
use jarvis_telemetry::Source;

pub fn run(limit: Option<usize>, source: Option<Source>) -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let limit = limit.unwrap_or(engine.config().recommend_limit);
    let recs = engine.recommend(limit, source, Utc::now());

    if recs.is_empty() {
        println!("No recommendations yet. Ingest some content first.");
        return Ok(());
    }

    println!("Recommendations");
    println!("===============");
    for (rank, rec) in recs.iter().enumerate() {
        println!("{:>2}. {}", rank + 1, format_recommendation(rec));
    }
    Ok(())
}

fn format_recommendation(rec: &Ranked) -> String {
    let title = rec
        .item
        .metadata
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or(&rec.item.item_id);
    format!(
        "[{}] {} ({}) score:{:.2}",
        rec.item.source, title, rec.item.category, rec.score
    )
}
