//! Countdown Registry - independently controllable countdown timers
//!
//! The registry keeps an ordered "in progress" sequence and an ordered
//! "recent" sequence of timers. Each running timer owns its own tick task;
//! a separate sweep moves timers that reached zero to the recent sequence.
//! The binary serves one registry over a local HTTP API.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::RegistryError;
pub use state::{AppState, Registry};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
