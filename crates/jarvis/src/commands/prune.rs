use chrono::Utc;

pub fn run() -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let now = Utc::now();
    let pruned = engine.prune(now)?;
    let evicted = engine.evict_stale(now)?;
    println!("Pruned {pruned} interactions, evicted {evicted} stale items");
    Ok(())
}
