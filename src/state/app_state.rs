//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    PromotionMode, Registry, RegistrySnapshot, TickOutcome, TimerId, TimerList,
};
use crate::{
    error::{RegistryError, Result},
    tasks::tick_task,
};

/// Cadence settings for ticking and sweeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub tick_interval: Duration,
    pub sweep_interval: Duration,
    pub promotion: PromotionMode,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            sweep_interval: Duration::from_secs(1),
            promotion: PromotionMode::Sweep,
        }
    }
}

/// Owner of one countdown registry instance.
///
/// Every mutation happens under the registry lock and is followed by a
/// fresh snapshot on the watch channel, so readers only ever see whole
/// sequences.
#[derive(Debug)]
pub struct AppState {
    registry: Mutex<Registry>,
    pub timing: Timing,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Latest projection of both sequences
    snapshot_tx: watch::Sender<RegistrySnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<RegistrySnapshot>,
    /// Cancelled on teardown; stops the sweep task
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(port: u16, host: String, timing: Timing) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(RegistrySnapshot::default());

        Self {
            registry: Mutex::new(Registry::new(timing.promotion)),
            timing,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Add a running timer and start its tick task
    pub fn add_timer(self: &Arc<Self>, duration_seconds: i64) -> Result<TimerId> {
        let (id, token) = {
            let mut registry = self.lock()?;
            let created = registry.add(duration_seconds).inspect_err(|e| {
                warn!("Rejected timer request: {}", e);
            })?;
            self.publish(&registry);
            created
        };

        info!("Timer {} added for {}s", id, duration_seconds);
        self.record_action(format!("add {}", id));
        self.spawn_ticker(id, token);
        Ok(id)
    }

    /// Pause a running timer. Returns whether anything changed.
    pub fn pause_timer(&self, id: TimerId) -> Result<bool> {
        let changed = self.mutate(|registry| registry.pause(id))?;
        self.log_transition("pause", id, changed);
        Ok(changed)
    }

    /// Resume a paused timer with time left
    pub fn resume_timer(self: &Arc<Self>, id: TimerId) -> Result<bool> {
        let token = self.mutate_optional(|registry| registry.resume(id))?;
        self.restart_ticker("resume", id, token)
    }

    /// Restart a timer in place from its remaining time
    pub fn restart_timer(self: &Arc<Self>, id: TimerId) -> Result<bool> {
        let token = self.mutate_optional(|registry| registry.restart(id))?;
        self.restart_ticker("restart", id, token)
    }

    /// Delete a timer from the named sequence
    pub fn delete_timer(&self, id: TimerId, list: TimerList) -> Result<bool> {
        let changed = self.mutate(|registry| registry.delete(id, list))?;
        self.log_transition("delete", id, changed);
        Ok(changed)
    }

    /// Apply one tick on behalf of the subscription owning `token`.
    ///
    /// The token is checked under the registry lock, so a tick racing a
    /// cancellation never lands.
    pub fn apply_tick(&self, id: TimerId, token: &CancellationToken) -> Result<TickOutcome> {
        let mut registry = self.lock()?;
        if token.is_cancelled() {
            return Ok(TickOutcome::Ignored);
        }

        let outcome = registry.tick(id);
        if outcome != TickOutcome::Ignored {
            self.publish(&registry);
        }
        Ok(outcome)
    }

    /// Promote every expired in-progress timer
    pub fn sweep(&self) -> Result<Vec<TimerId>> {
        let mut registry = self.lock()?;
        let promoted = registry.sweep();
        if !promoted.is_empty() {
            self.publish(&registry);
        }
        Ok(promoted)
    }

    /// Cancel every live subscription and stop the sweep
    pub fn teardown(&self) -> Result<usize> {
        self.shutdown.cancel();
        let mut registry = self.lock()?;
        let cancelled = registry.shutdown();
        self.publish(&registry);
        info!("Registry torn down, cancelled {} subscriptions", cancelled);
        Ok(cancelled)
    }

    /// Current projection of both sequences
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Watch for projection updates
    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn live_subscriptions(&self) -> Result<usize> {
        Ok(self.lock()?.subscription_count())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    fn publish(&self, registry: &Registry) {
        if let Err(e) = self.snapshot_tx.send(registry.snapshot()) {
            warn!("Failed to publish registry snapshot: {}", e);
        }
    }

    fn mutate<F>(&self, op: F) -> Result<bool>
    where
        F: FnOnce(&mut Registry) -> bool,
    {
        let mut registry = self.lock()?;
        let changed = op(&mut *registry);
        if changed {
            self.publish(&registry);
        }
        Ok(changed)
    }

    fn mutate_optional<F>(&self, op: F) -> Result<Option<CancellationToken>>
    where
        F: FnOnce(&mut Registry) -> Option<CancellationToken>,
    {
        let mut registry = self.lock()?;
        let token = op(&mut *registry);
        if token.is_some() {
            self.publish(&registry);
        }
        Ok(token)
    }

    fn restart_ticker(
        self: &Arc<Self>,
        action: &str,
        id: TimerId,
        token: Option<CancellationToken>,
    ) -> Result<bool> {
        let changed = token.is_some();
        self.log_transition(action, id, changed);
        if let Some(token) = token {
            self.spawn_ticker(id, token);
        }
        Ok(changed)
    }

    fn spawn_ticker(self: &Arc<Self>, id: TimerId, token: CancellationToken) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            tick_task(state, id, token).await;
        });
    }

    fn log_transition(&self, action: &str, id: TimerId, changed: bool) {
        if changed {
            info!("Timer {}: {}", id, action);
            self.record_action(format!("{} {}", action, id));
        } else {
            debug!("Timer {}: {} was a no-op", id, action);
        }
    }

    fn record_action(&self, action: String) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action);
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }
}
