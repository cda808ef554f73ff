pub fn run(top: usize) -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let insights = engine.insights(top)?;
    println!("{}", serde_json::to_string_pretty(&insights)?);
    Ok(())
}
