//! Per-timer tick task

use std::sync::Arc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::state::{AppState, TickOutcome, TimerId};

/// Tick one timer every `tick_interval` until it expires or `token` is cancelled.
///
/// The first tick lands one full period after the task starts.
pub async fn tick_task(state: Arc<AppState>, id: TimerId, token: CancellationToken) {
    let period = state.timing.tick_interval;
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!("Tick task started for timer {}", id);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Tick task for timer {} cancelled", id);
                break;
            }

            _ = interval.tick() => {
                match state.apply_tick(id, &token) {
                    Ok(TickOutcome::Ticked { remaining_seconds }) => {
                        debug!("Timer {} has {}s left", id, remaining_seconds);
                    }
                    Ok(TickOutcome::Expired) => {
                        info!("Timer {} reached zero, awaiting sweep", id);
                        break;
                    }
                    Ok(TickOutcome::Promoted) => {
                        info!("Timer {} completed", id);
                        break;
                    }
                    Ok(TickOutcome::Ignored) => break,
                    Err(e) => {
                        error!("Failed to tick timer {}: {}", id, e);
                        break;
                    }
                }
            }
        }
    }
}
