//! State management module
//!
//! This module contains the timer records, the registry bookkeeping and the
//! application state that owns one registry instance.

pub mod app_state;
pub mod registry;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, Timing};
pub use registry::{PromotionMode, Registry, RegistrySnapshot, TickOutcome};
pub use timer_state::{format_hms, TimerId, TimerList, TimerRecord, TimerStatus, TimerView};
