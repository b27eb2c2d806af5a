//! Timer record structure and display formatting

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Last identity handed out in this process
static LAST_TIMER_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque timer identity, unique and increasing for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(u64);

impl TimerId {
    /// Allocate a new id derived from the current time in milliseconds.
    ///
    /// Two timers created within the same millisecond (or after a clock step
    /// backwards) still get strictly increasing ids.
    pub fn next() -> Self {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut last = LAST_TIMER_ID.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match LAST_TIMER_ID.compare_exchange_weak(
                last,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(candidate),
                Err(actual) => last = actual,
            }
        }
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for TimerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Running,
    Paused,
    Completed,
}

/// Which of the two registry sequences a timer lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerList {
    #[default]
    InProgress,
    Recent,
}

/// One countdown's full state. Carries no live callback handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub id: TimerId,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub status: TimerStatus,
}

impl TimerRecord {
    /// Create a running record with the full duration remaining
    pub fn running(id: TimerId, duration_seconds: u64) -> Self {
        Self {
            id,
            duration_seconds,
            remaining_seconds: duration_seconds,
            status: TimerStatus::Running,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }

    /// Remaining time as `h:mm:ss`
    pub fn display(&self) -> String {
        format_hms(self.remaining_seconds)
    }
}

/// Read-only projection of a record for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerView {
    pub id: TimerId,
    pub display: String,
    pub status: TimerStatus,
    pub remaining_seconds: u64,
    pub duration_seconds: u64,
}

impl From<&TimerRecord> for TimerView {
    fn from(record: &TimerRecord) -> Self {
        Self {
            id: record.id,
            display: record.display(),
            status: record.status,
            remaining_seconds: record.remaining_seconds,
            duration_seconds: record.duration_seconds,
        }
    }
}

/// Format seconds as `h:mm:ss` with unpadded hours
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}
