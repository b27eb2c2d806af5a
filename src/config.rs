//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

use crate::state::{PromotionMode, Timing};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "countdown-registry")]
#[command(about = "A registry of independently controllable countdown timers")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Milliseconds between two ticks of a running timer
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Milliseconds between two completion sweeps
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_ms: u64,

    /// Promote timers inside the tick that reaches zero instead of on the next sweep
    #[arg(long)]
    pub immediate_promotion: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            tick_interval: Duration::from_millis(self.tick_ms),
            sweep_interval: Duration::from_millis(self.sweep_ms),
            promotion: if self.immediate_promotion {
                PromotionMode::Immediate
            } else {
                PromotionMode::Sweep
            },
        }
    }
}
