//! Background tasks module
//!
//! Per-timer tick tasks and the registry-wide completion sweep.

pub mod sweep;
pub mod tick;

// Re-export main functions
pub use sweep::sweep_task;
pub use tick::tick_task;
