use chrono::Utc;
use jarvis_core::{shutdown_channel, ContentSource, JsonlSource, Scheduler};
use jarvis_telemetry::Source;
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};

pub fn run(drop_dir: Option<&str>) -> anyhow::Result<()> {
    let mut engine = super::open_engine()?;
    let drop_dir = drop_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| engine.paths().drop_dir());

    let sources: Vec<Box<dyn ContentSource>> = Source::ALL
        .iter()
        .map(|s| Box::new(JsonlSource::in_dir(*s, &drop_dir)) as Box<dyn ContentSource>)
        .collect();
    let mut scheduler = Scheduler::from_config(engine.config(), Utc::now());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (tx, rx) = shutdown_channel();
        tokio::spawn(stop_on(tokio::signal::ctrl_c(), tx));

        info!(drop_dir = %drop_dir.display(), "watching drop files");
        scheduler.run(&mut engine, &sources, rx).await
    })?;

    Ok(())
}

/// Flip `tx` when `signal` fires. If the signal cannot be listened for, keep
/// the sender alive so the scheduler runs on instead of stopping at once.
async fn stop_on<F>(signal: F, tx: watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("shutdown requested");
            let _ = tx.send(true);
        }
        Err(e) => {
            warn!("could not listen for ctrl-c, stop the process to exit: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_requests_shutdown() {
        let (tx, rx) = shutdown_channel();
        stop_on(async { Ok(()) }, tx).await;
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_failed_signal_keeps_running() {
        let (tx, mut rx) = shutdown_channel();
        let failing = async { Err(std::io::Error::other("no signal handler")) };

        let waited = tokio::time::timeout(Duration::from_millis(50), stop_on(failing, tx)).await;

        assert!(waited.is_err(), "listener should stay pending");
        assert!(!*rx.borrow_and_update());
    }
}
