//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, warn};

use crate::{
    error::RegistryError,
    state::{AppState, RegistrySnapshot, TimerId},
};
use super::responses::{AddTimerRequest, ApiResponse, DeleteQuery, HealthResponse, StatusResponse};

type OperationResult = Result<(StatusCode, Json<ApiResponse>), StatusCode>;

/// Handle GET /timers - Return both sequences
pub async fn list_timers_handler(State(state): State<Arc<AppState>>) -> Json<RegistrySnapshot> {
    Json(state.snapshot())
}

/// Handle POST /timers - Add and start a countdown
pub async fn add_timer_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddTimerRequest>, JsonRejection>,
) -> OperationResult {
    // Malformed, fractional or out-of-range durations get the same 400 body
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected timer request body: {}", rejection.body_text());
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    format!("Invalid timer request: {}", rejection.body_text()),
                    state.snapshot(),
                )),
            ));
        }
    };

    match state.add_timer(request.duration_seconds) {
        Ok(id) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::changed(
                format!("Timer started for {}s", request.duration_seconds),
                id,
                state.snapshot(),
            )),
        )),
        Err(e @ RegistryError::InvalidDuration(_)) => Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(e.to_string(), state.snapshot())),
        )),
        Err(e @ RegistryError::Closed) => Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::error(e.to_string(), state.snapshot())),
        )),
        Err(e) => {
            error!("Failed to add timer: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timers/:id/pause
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> OperationResult {
    let id = TimerId::from(id);
    respond(&state, "pause", id, state.pause_timer(id))
}

/// Handle POST /timers/:id/resume
pub async fn resume_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> OperationResult {
    let id = TimerId::from(id);
    respond(&state, "resume", id, state.resume_timer(id))
}

/// Handle POST /timers/:id/restart
pub async fn restart_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> OperationResult {
    let id = TimerId::from(id);
    respond(&state, "restart", id, state.restart_timer(id))
}

/// Handle DELETE /timers/:id?list=in_progress|recent
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<DeleteQuery>,
) -> OperationResult {
    let id = TimerId::from(id);
    respond(&state, "delete", id, state.delete_timer(id, query.list))
}

/// Handle GET /status - Return registry counts and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let live_subscriptions = match state.live_subscriptions() {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to read registry: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let snapshot = state.snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        in_progress: snapshot.in_progress.len(),
        recent: snapshot.recent.len(),
        live_subscriptions,
        promotion: state.timing.promotion,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Unknown ids and invalid transitions are answered as `unchanged`, never as errors
fn respond(
    state: &AppState,
    action: &str,
    id: TimerId,
    outcome: Result<bool, RegistryError>,
) -> OperationResult {
    match outcome {
        Ok(true) => Ok((
            StatusCode::OK,
            Json(ApiResponse::changed(format!("Timer {} {}", id, action), id, state.snapshot())),
        )),
        Ok(false) => Ok((
            StatusCode::OK,
            Json(ApiResponse::unchanged(
                format!("Timer {}: nothing to {}", id, action),
                id,
                state.snapshot(),
            )),
        )),
        Err(e) => {
            error!("Failed to {} timer {}: {}", action, id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
