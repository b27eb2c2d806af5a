//! Countdown Registry - serves a countdown timer registry over HTTP
//!
//! This is the main entry point for the countdown-registry application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use countdown_registry::{
    api::create_router,
    config::Config,
    state::AppState,
    tasks::sweep_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_registry={},tower_http=info", config.log_level()))
        .init();

    let timing = config.timing();
    info!("Starting countdown-registry v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={:?}, sweep={:?}, promotion={:?}",
          config.host, config.port, timing.tick_interval, timing.sweep_interval, timing.promotion);

    // One registry per process, torn down on shutdown
    let state = Arc::new(AppState::new(config.port, config.host.clone(), timing));

    let sweep_state = Arc::clone(&state);
    let sweeper = tokio::spawn(async move {
        sweep_task(sweep_state).await;
    });

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers             - List in-progress and recent timers");
    info!("  POST   /timers             - Add a timer {{\"duration_seconds\": n}}");
    info!("  POST   /timers/:id/pause   - Pause a running timer");
    info!("  POST   /timers/:id/resume  - Resume a paused timer");
    info!("  POST   /timers/:id/restart - Restart a timer from its remaining time");
    info!("  DELETE /timers/:id         - Delete a timer (?list=in_progress|recent)");
    info!("  GET    /status             - Registry counts and uptime");
    info!("  GET    /health             - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.teardown()?;
    sweeper.await?;

    info!("Server shutdown complete");
    Ok(())
}
