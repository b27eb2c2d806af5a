//! Completion sweep background task

use std::sync::Arc;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task that promotes expired timers to the recent sequence.
///
/// Runs on its own cadence, independent of the per-timer tick tasks, until
/// the registry is torn down.
pub async fn sweep_task(state: Arc<AppState>) {
    info!("Starting completion sweep task");

    let period = state.timing.sweep_interval;
    let mut interval = interval_at(Instant::now() + period, period);
    let shutdown = state.shutdown_token();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Sweep task stopping");
                break;
            }

            _ = interval.tick() => {
                match state.sweep() {
                    Ok(promoted) if !promoted.is_empty() => {
                        info!("Sweep promoted {} timer(s): {:?}", promoted.len(), promoted);
                    }
                    Ok(_) => {}
                    Err(e) => error!("Sweep failed: {}", e),
                }
            }
        }
    }
}
