use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::tasks::maintenance;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = vec![
        tokio::spawn(abandon_sweep_loop(state.clone(), shutdown_rx.clone())),
        tokio::spawn(artifact_repair_loop(state.clone(), shutdown_rx.clone())),
    ];

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn abandon_sweep_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period = state.settings().testing().abandon_sweep_interval_seconds;
    let mut tick = interval(Duration::from_secs(period));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = maintenance::abandon_stale_attempts(&state).await {
                    tracing::error!(error = %format!("{err:#}"), "abandon_stale_attempts failed");
                }
            }
        }
    }
}

async fn artifact_repair_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period = state.settings().testing().artifact_repair_interval_seconds;
    let mut tick = interval(Duration::from_secs(period));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = maintenance::repair_missing_artifacts(&state).await {
                    tracing::error!(error = %format!("{err:#}"), "repair_missing_artifacts failed");
                }
            }
        }
    }
}
