//! Liveness endpoint.
//!
//! Reports `degraded` once any actor has stopped or missed its heartbeat
//! window; the process itself still answers 200 so the caller can read why.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let directory = state.coordinator.directory();
    let serving = directory
        .iter()
        .filter(|actor| actor.is_alive() && !actor.is_closed())
        .count();
    let status = if serving == directory.len() { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "actors": { "serving": serving, "total": directory.len() },
    }))
}
