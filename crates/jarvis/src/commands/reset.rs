use chrono::Utc;

pub fn run() -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    match engine.reset(Utc::now())? {
        Some(archived) => println!("✓ Preferences reset; history archived to {}", archived.display()),
        None => println!("✓ Preferences reset; no history to archive"),
    }
    Ok(())
}
