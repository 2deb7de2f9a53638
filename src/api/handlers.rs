//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tokio::time::sleep;
use tracing::debug;

use super::responses::HealthResponse;
use crate::state::AppState;

/// Handle GET / - Wait the configured delay, then answer "hello"
pub async fn hello_handler(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if !state.response_delay.is_zero() {
        debug!("Delaying response by {:?}", state.response_delay);
        sleep(state.response_delay).await;
    }

    let served = state.record_request();
    debug!("Served request #{}", served);
    (StatusCode::OK, "hello")
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.get_uptime(), state.requests_served()))
}
