//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{PromotionMode, RegistrySnapshot, TimerId, TimerList};

/// Body of `POST /timers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTimerRequest {
    pub duration_seconds: i64,
}

/// Query of `DELETE /timers/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub list: TimerList,
}

/// API response structure for timer operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_id: Option<TimerId>,
    pub timestamp: DateTime<Utc>,
    pub timers: RegistrySnapshot,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, timer_id: Option<TimerId>, timers: RegistrySnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timer_id,
            timestamp: Utc::now(),
            timers,
        }
    }

    /// The operation changed registry state
    pub fn changed(message: String, timer_id: TimerId, timers: RegistrySnapshot) -> Self {
        Self::new("changed", message, Some(timer_id), timers)
    }

    /// The operation was a tolerated no-op
    pub fn unchanged(message: String, timer_id: TimerId, timers: RegistrySnapshot) -> Self {
        Self::new("unchanged", message, Some(timer_id), timers)
    }

    pub fn error(message: String, timers: RegistrySnapshot) -> Self {
        Self::new("error", message, None, timers)
    }
}

/// Status response with registry counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub in_progress: usize,
    pub recent: usize,
    pub live_subscriptions: usize,
    pub promotion: PromotionMode,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
