pub mod history;
pub mod ingest;
pub mod insights;
pub mod prune;
pub mod recommend;
pub mod reset;
pub mod recompute;
pub mod record;
pub mod run;
pub mod status;
pub mod version;

use jarvis_core::Engine;
use jarvis_telemetry::Paths;

/// Open the engine over the default data directory
pub fn open_engine() -> anyhow::Result<Engine> {
    let paths = Paths::new()?;
    Ok(Engine::open(paths)?)
}
