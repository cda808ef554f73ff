use chrono::{DateTime, Utc};
use jarvis_telemetry::{Action, InteractionEvent};

pub fn run(
    item: &str,
    category: &str,
    action: Action,
    at: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let engine = super::open_engine()?;
    let event = InteractionEvent::new(item, category, action, at.unwrap_or_else(Utc::now));
    engine.record(event)?;
    println!("✓ Recorded {action} for {item} ({category})");
    Ok(())
}
