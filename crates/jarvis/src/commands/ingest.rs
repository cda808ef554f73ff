use chrono::Utc;
use jarvis_core::JsonlSource;
use jarvis_telemetry::Source;

pub fn run(source: Source, file: Option<&str>) -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let adapter = match file {
        Some(path) => JsonlSource::new(source, path),
        None => JsonlSource::in_dir(source, engine.paths().drop_dir()),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let counts = runtime.block_on(engine.refresh_source(&adapter, Utc::now()))?;

    println!("{}", serde_json::to_string(&counts)?);
    Ok(())
}
