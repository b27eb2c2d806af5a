//! Countdown registry bookkeeping
//!
//! The registry owns the in-progress and recent sequences together with a
//! side table of tick subscriptions. It never spawns anything itself: every
//! operation that starts ticking hands back a [`CancellationToken`] that the
//! owner binds to a tick task, and every operation that stops ticking cancels
//! the stored token before returning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::timer_state::{TimerId, TimerList, TimerRecord, TimerStatus, TimerView};
use crate::error::{RegistryError, Result};

/// When a timer that reached zero moves to the recent sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionMode {
    /// Promotion waits for the next registry-wide sweep
    #[default]
    Sweep,
    /// Promotion happens inside the tick that reaches zero
    Immediate,
}

/// Result of applying one tick to a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No live subscription or no running record; nothing changed
    Ignored,
    /// Decremented, still counting down
    Ticked { remaining_seconds: u64 },
    /// Reached zero and awaits the sweep
    Expired,
    /// Reached zero and was moved to the recent sequence
    Promoted,
}

impl TickOutcome {
    /// Whether the tick task should keep running
    pub fn keeps_ticking(&self) -> bool {
        matches!(self, TickOutcome::Ticked { .. })
    }
}

/// Immutable projection of both sequences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub in_progress: Vec<TimerView>,
    pub recent: Vec<TimerView>,
}

impl RegistrySnapshot {
    pub fn find(&self, id: TimerId) -> Option<&TimerView> {
        self.in_progress
            .iter()
            .chain(self.recent.iter())
            .find(|view| view.id == id)
    }
}

#[derive(Debug)]
pub struct Registry {
    in_progress: Vec<TimerRecord>,
    recent: Vec<TimerRecord>,
    /// Live tick subscriptions, at most one per timer
    subscriptions: HashMap<TimerId, CancellationToken>,
    promotion: PromotionMode,
    /// Set by `shutdown`; nothing starts ticking afterwards
    closed: bool,
}

impl Registry {
    pub fn new(promotion: PromotionMode) -> Self {
        Self {
            in_progress: Vec::new(),
            recent: Vec::new(),
            subscriptions: HashMap::new(),
            promotion,
            closed: false,
        }
    }

    pub fn promotion_mode(&self) -> PromotionMode {
        self.promotion
    }

    /// Create a running timer and its tick subscription.
    ///
    /// Non-positive durations are rejected before any state changes.
    pub fn add(&mut self, duration_seconds: i64) -> Result<(TimerId, CancellationToken)> {
        if self.closed {
            return Err(RegistryError::Closed);
        }
        let duration = u64::try_from(duration_seconds)
            .ok()
            .filter(|&d| d > 0)
            .ok_or(RegistryError::InvalidDuration(duration_seconds))?;

        let id = TimerId::next();
        self.in_progress.push(TimerRecord::running(id, duration));
        let token = CancellationToken::new();
        self.subscriptions.insert(id, token.clone());

        debug!("Added timer {} for {}s", id, duration);
        Ok((id, token))
    }

    /// Suspend a running timer. Returns whether anything changed.
    pub fn pause(&mut self, id: TimerId) -> bool {
        let Some(record) = self.in_progress.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if record.status != TimerStatus::Running {
            return false;
        }
        record.status = TimerStatus::Paused;
        self.unsubscribe(id);
        true
    }

    /// Reattach ticking to a paused timer with time left.
    ///
    /// Returns the token of the new subscription, or `None` for a no-op.
    pub fn resume(&mut self, id: TimerId) -> Option<CancellationToken> {
        if self.closed {
            return None;
        }
        let record = self.in_progress.iter_mut().find(|t| t.id == id)?;
        if record.status != TimerStatus::Paused || record.remaining_seconds == 0 {
            return None;
        }
        if self.subscriptions.contains_key(&id) {
            return None;
        }
        record.status = TimerStatus::Running;
        let token = CancellationToken::new();
        self.subscriptions.insert(id, token.clone());
        Some(token)
    }

    /// Resume counting in place from the remaining time.
    ///
    /// Completed timers have nothing left to count down, so restarting one
    /// is a no-op; a paused timer restarts exactly like [`Registry::resume`].
    pub fn restart(&mut self, id: TimerId) -> Option<CancellationToken> {
        match self.locate(id)? {
            TimerList::InProgress => self.resume(id),
            TimerList::Recent => {
                debug!("Timer {} is completed, restart ignored", id);
                None
            }
        }
    }

    /// Apply one tick to a running timer
    pub fn tick(&mut self, id: TimerId) -> TickOutcome {
        if !self.subscriptions.contains_key(&id) {
            return TickOutcome::Ignored;
        }
        let Some(record) = self
            .in_progress
            .iter_mut()
            .find(|t| t.id == id && t.status == TimerStatus::Running)
        else {
            self.unsubscribe(id);
            return TickOutcome::Ignored;
        };

        record.remaining_seconds = record.remaining_seconds.saturating_sub(1);
        if record.remaining_seconds > 0 {
            return TickOutcome::Ticked {
                remaining_seconds: record.remaining_seconds,
            };
        }

        record.status = TimerStatus::Completed;
        self.unsubscribe(id);
        if self.promotion == PromotionMode::Immediate && self.promote(id) {
            TickOutcome::Promoted
        } else {
            TickOutcome::Expired
        }
    }

    /// Move a zero-remaining timer from in-progress to recent
    pub fn promote(&mut self, id: TimerId) -> bool {
        let Some(index) = self
            .in_progress
            .iter()
            .position(|t| t.id == id && t.is_expired())
        else {
            return false;
        };

        self.unsubscribe(id);
        let mut record = self.in_progress.remove(index);
        record.status = TimerStatus::Completed;
        self.recent.push(record);
        true
    }

    /// Promote every expired in-progress timer, in sequence order
    pub fn sweep(&mut self) -> Vec<TimerId> {
        let expired: Vec<TimerId> = self
            .in_progress
            .iter()
            .filter(|t| t.is_expired())
            .map(|t| t.id)
            .collect();

        expired.into_iter().filter(|&id| self.promote(id)).collect()
    }

    /// Remove a timer from the named sequence, cancelling its subscription.
    ///
    /// Returns whether a record was removed.
    pub fn delete(&mut self, id: TimerId, list: TimerList) -> bool {
        let sequence = match list {
            TimerList::InProgress => &mut self.in_progress,
            TimerList::Recent => &mut self.recent,
        };
        let Some(index) = sequence.iter().position(|t| t.id == id) else {
            return false;
        };

        self.unsubscribe(id);
        match list {
            TimerList::InProgress => self.in_progress.remove(index),
            TimerList::Recent => self.recent.remove(index),
        };
        true
    }

    /// Cancel every live subscription and close the registry.
    ///
    /// Running timers are left Paused. Once closed, add is rejected and
    /// resume/restart are no-ops. Returns how many subscriptions were cancelled.
    pub fn shutdown(&mut self) -> usize {
        self.closed = true;
        let count = self.subscriptions.len();
        for (_, token) in self.subscriptions.drain() {
            token.cancel();
        }
        for record in self
            .in_progress
            .iter_mut()
            .filter(|t| t.status == TimerStatus::Running)
        {
            record.status = TimerStatus::Paused;
        }
        count
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get(&self, id: TimerId) -> Option<&TimerRecord> {
        self.in_progress
            .iter()
            .chain(self.recent.iter())
            .find(|t| t.id == id)
    }

    /// Which sequence currently holds the timer
    pub fn locate(&self, id: TimerId) -> Option<TimerList> {
        if self.in_progress.iter().any(|t| t.id == id) {
            Some(TimerList::InProgress)
        } else if self.recent.iter().any(|t| t.id == id) {
            Some(TimerList::Recent)
        } else {
            None
        }
    }

    pub fn in_progress(&self) -> &[TimerRecord] {
        &self.in_progress
    }

    pub fn recent(&self) -> &[TimerRecord] {
        &self.recent
    }

    pub fn is_subscribed(&self, id: TimerId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            in_progress: self.in_progress.iter().map(TimerView::from).collect(),
            recent: self.recent.iter().map(TimerView::from).collect(),
        }
    }

    fn unsubscribe(&mut self, id: TimerId) {
        if let Some(token) = self.subscriptions.remove(&id) {
            token.cancel();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(PromotionMode::default())
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_n(registry: &mut Registry, id: TimerId, n: usize) {
        for _ in 0..n {
            registry.tick(id);
        }
    }

    fn remaining(registry: &Registry, id: TimerId) -> u64 {
        registry.get(id).unwrap().remaining_seconds
    }

    #[test]
    fn add_creates_running_timer() {
        let mut registry = Registry::default();
        for duration in [1, 5, 59, 3600, 86_399] {
            let (id, token) = registry.add(duration).unwrap();
            let record = registry.get(id).unwrap();
            assert_eq!(record.status, TimerStatus::Running);
            assert_eq!(record.remaining_seconds, duration as u64);
            assert_eq!(record.duration_seconds, duration as u64);
            assert!(registry.is_subscribed(id));
            assert!(!token.is_cancelled());
        }
        assert_eq!(registry.in_progress().len(), 5);
    }

    #[test]
    fn add_rejects_non_positive_duration() {
        let mut registry = Registry::default();
        registry.add(3).unwrap();
        let before = registry.snapshot();

        for duration in [0, -1, i64::MIN] {
            assert_eq!(
                registry.add(duration).unwrap_err(),
                RegistryError::InvalidDuration(duration)
            );
        }
        assert_eq!(registry.snapshot(), before);
        assert_eq!(registry.subscription_count(), 1);
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut registry = Registry::default();
        let ids: Vec<TimerId> = [30, 10, 20]
            .into_iter()
            .map(|d| registry.add(d).unwrap().0)
            .collect();
        let order: Vec<TimerId> = registry.in_progress().iter().map(|t| t.id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn ticks_decrement_and_floor_at_zero() {
        let mut registry = Registry::default();
        let (id, _) = registry.add(4).unwrap();

        assert_eq!(registry.tick(id), TickOutcome::Ticked { remaining_seconds: 3 });
        tick_n(&mut registry, id, 2);
        assert_eq!(remaining(&registry, id), 1);

        assert_eq!(registry.tick(id), TickOutcome::Expired);
        assert_eq!(remaining(&registry, id), 0);

        // Subscription is gone, further ticks are ignored
        assert_eq!(registry.tick(id), TickOutcome::Ignored);
        assert_eq!(remaining(&registry, id), 0);
    }

    #[test]
    fn expiry_cancels_subscription_and_waits_for_sweep() {
        let mut registry = Registry::new(PromotionMode::Sweep);
        let (id, token) = registry.add(2).unwrap();
        tick_n(&mut registry, id, 2);

        assert!(token.is_cancelled());
        assert!(!registry.is_subscribed(id));
        assert_eq!(registry.locate(id), Some(TimerList::InProgress));
        assert_eq!(registry.get(id).unwrap().status, TimerStatus::Completed);

        assert_eq!(registry.sweep(), vec![id]);
        assert_eq!(registry.locate(id), Some(TimerList::Recent));
        assert!(registry.sweep().is_empty());
    }

    #[test]
    fn immediate_mode_promotes_inside_tick() {
        let mut registry = Registry::new(PromotionMode::Immediate);
        let (id, token) = registry.add(1).unwrap();

        assert_eq!(registry.tick(id), TickOutcome::Promoted);
        assert!(token.is_cancelled());
        assert!(registry.in_progress().is_empty());
        assert_eq!(registry.recent()[0].id, id);
        assert_eq!(registry.recent()[0].status, TimerStatus::Completed);
    }

    #[test]
    fn pause_stops_ticks() {
        let mut registry = Registry::default();
        let (id, token) = registry.add(10).unwrap();
        tick_n(&mut registry, id, 3);

        assert!(registry.pause(id));
        assert!(token.is_cancelled());
        assert_eq!(registry.get(id).unwrap().status, TimerStatus::Paused);

        tick_n(&mut registry, id, 5);
        for _ in 0..3 {
            registry.sweep();
        }
        assert_eq!(remaining(&registry, id), 7);
    }

    #[test]
    fn pause_is_noop_unless_running() {
        let mut registry = Registry::default();
        assert!(!registry.pause(TimerId::from(7)));

        let (id, _) = registry.add(1).unwrap();
        assert!(registry.pause(id));
        assert!(!registry.pause(id));

        let (done, _) = registry.add(1).unwrap();
        registry.tick(done);
        registry.sweep();
        assert!(!registry.pause(done));
        assert_eq!(registry.get(done).unwrap().status, TimerStatus::Completed);
    }

    #[test]
    fn resume_reattaches_single_subscription() {
        let mut registry = Registry::default();
        let (id, _) = registry.add(10).unwrap();
        tick_n(&mut registry, id, 3);
        registry.pause(id);

        let token = registry.resume(id).expect("paused timer resumes");
        assert!(!token.is_cancelled());
        assert_eq!(registry.get(id).unwrap().status, TimerStatus::Running);
        assert_eq!(remaining(&registry, id), 7);

        // Already running: no second subscription
        assert!(registry.resume(id).is_none());
        assert_eq!(registry.subscription_count(), 1);

        registry.tick(id);
        assert_eq!(remaining(&registry, id), 6);
    }

    #[test]
    fn resume_is_noop_for_unknown_or_completed() {
        let mut registry = Registry::default();
        assert!(registry.resume(TimerId::from(1)).is_none());

        let (id, _) = registry.add(1).unwrap();
        registry.tick(id);
        assert!(registry.resume(id).is_none());
        registry.sweep();
        assert!(registry.resume(id).is_none());
    }

    #[test]
    fn restart_resumes_paused_in_place() {
        let mut registry = Registry::default();
        let (id, _) = registry.add(10).unwrap();
        tick_n(&mut registry, id, 4);
        registry.pause(id);

        assert!(registry.restart(id).is_some());
        let record = registry.get(id).unwrap();
        assert_eq!(record.status, TimerStatus::Running);
        assert_eq!(record.remaining_seconds, 6);
    }

    #[test]
    fn restart_of_completed_timer_is_noop() {
        let mut registry = Registry::default();
        let (id, _) = registry.add(2).unwrap();
        tick_n(&mut registry, id, 2);
        registry.sweep();
        let before = registry.snapshot();

        assert!(registry.restart(id).is_none());
        assert_eq!(registry.snapshot(), before);
        assert!(!registry.is_subscribed(id));
    }

    #[test]
    fn delete_cancels_subscription() {
        let mut registry = Registry::default();
        let (id, token) = registry.add(3).unwrap();

        assert!(registry.delete(id, TimerList::InProgress));
        assert!(token.is_cancelled());
        assert!(registry.in_progress().is_empty());
        assert_eq!(registry.tick(id), TickOutcome::Ignored);
        assert!(registry.get(id).is_none());
    }

    #[test]
    fn delete_respects_named_list() {
        let mut registry = Registry::default();
        let (running, token) = registry.add(5).unwrap();
        let (done, _) = registry.add(1).unwrap();
        registry.tick(done);
        registry.sweep();

        // Wrong list: nothing removed, running timer keeps its subscription
        assert!(!registry.delete(running, TimerList::Recent));
        assert!(!token.is_cancelled());
        assert!(!registry.delete(done, TimerList::InProgress));

        assert!(registry.delete(done, TimerList::Recent));
        assert!(registry.recent().is_empty());
        assert!(!registry.delete(TimerId::from(99), TimerList::Recent));
    }

    #[test]
    fn shorter_timer_completes_first() {
        let mut registry = Registry::default();
        let (short, _) = registry.add(2).unwrap();
        let (long, _) = registry.add(4).unwrap();

        for _ in 0..2 {
            registry.tick(short);
            registry.tick(long);
        }
        registry.sweep();

        assert_eq!(registry.recent().len(), 1);
        assert_eq!(registry.recent()[0].id, short);
        assert_eq!(registry.in_progress().len(), 1);
        assert_eq!(registry.in_progress()[0].id, long);
        assert_eq!(remaining(&registry, long), 2);
    }

    #[test]
    fn shutdown_cancels_everything() {
        let mut registry = Registry::default();
        let tokens: Vec<CancellationToken> =
            (1..=3).map(|d| registry.add(d).unwrap().1).collect();

        assert_eq!(registry.shutdown(), 3);
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn shutdown_pauses_running_and_closes() {
        let mut registry = Registry::default();
        let (running, _) = registry.add(10).unwrap();
        let (paused, _) = registry.add(10).unwrap();
        registry.pause(paused);
        tick_n(&mut registry, running, 2);

        registry.shutdown();
        assert!(registry.is_closed());
        assert!(registry
            .snapshot()
            .in_progress
            .iter()
            .all(|view| view.status == TimerStatus::Paused));
        assert_eq!(remaining(&registry, running), 8);

        assert_eq!(registry.add(5).unwrap_err(), RegistryError::Closed);
        assert!(registry.resume(running).is_none());
        assert!(registry.restart(paused).is_none());
        assert_eq!(registry.tick(running), TickOutcome::Ignored);
        assert_eq!(registry.in_progress().len(), 2);
        assert_eq!(registry.subscription_count(), 0);
    }

    #[test]
    fn drop_cancels_subscriptions() {
        let mut registry = Registry::default();
        let (_, token) = registry.add(30).unwrap();
        drop(registry);
        assert!(token.is_cancelled());
    }

    #[test]
    fn snapshot_projects_both_sequences() {
        let mut registry = Registry::default();
        let (a, _) = registry.add(65).unwrap();
        let (b, _) = registry.add(1).unwrap();
        registry.tick(b);
        registry.sweep();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.in_progress.len(), 1);
        assert_eq!(snapshot.in_progress[0].display, "0:01:05");
        assert_eq!(snapshot.recent[0].display, "0:00:00");
        assert_eq!(snapshot.find(a).unwrap().status, TimerStatus::Running);
        assert_eq!(snapshot.find(b).unwrap().status, TimerStatus::Completed);
    }
}
