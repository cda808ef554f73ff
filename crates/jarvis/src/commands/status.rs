pub fn run() -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let status = engine.status();
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
