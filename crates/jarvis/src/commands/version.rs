pub fn run() -> anyhow::Result<()> {
    println!("jarvis {}", env!("CARGO_PKG_VERSION"));
    println!("Preference learning and recommendation engine");
    Ok(())
}
