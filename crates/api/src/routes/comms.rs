//! Notification request routes.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};

use relay_common::error::AppError;
use relay_common::types::{SendRequest, SendResponse};
use relay_engine::{CoordinatorStatus, DispatchError};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comms", post(send))
        .route("/comms/status", get(status))
}

/// POST /comms — Queue a notification request.
///
/// `{"status": "true"}` means the request is queued, not delivered. A full
/// ingress queue answers 503 with an error body and nothing else.
async fn send(
    State(state): State<AppState>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::Decode(e.body_text()))?;
    let channel = req.channel;

    state.coordinator.submit(req.into()).map_err(|e| {
        tracing::debug!(channel = %channel, error = %e, "Send request refused");
        match e {
            DispatchError::Overloaded => AppError::Overloaded(e.to_string()),
            DispatchError::Stopped => AppError::Unavailable(e.to_string()),
        }
    })?;

    Ok(Json(SendResponse::accepted(true)))
}

/// GET /comms/status — Ingress occupancy, dispatch counters and actor status.
async fn status(State(state): State<AppState>) -> Json<CoordinatorStatus> {
    Json(state.coordinator.status())
}
